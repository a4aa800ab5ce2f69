// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use assert_matches::assert_matches;
use chrono::{DateTime, TimeZone, Utc};
use nada_access::*;
use nada_access_inmem::InMemoryAccessRepository;
use nada_datasets::DatasetID;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2050, 1, 1, 12, 0, 0).unwrap()
}

fn new_access(dataset_id: DatasetID, subject: Subject, platform: Platform) -> Access {
    Access {
        id: AccessID::new_random(),
        dataset_id,
        owner: subject.email.clone(),
        subject,
        platform,
        granter: "owner@example.com".to_string(),
        created: t0(),
        expires: None,
        revoked: None,
        access_request_id: None,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_find_active_access_matches_platform() {
    let repo = InMemoryAccessRepository::new();
    let dataset_id = DatasetID::new_random();
    let alice = Subject::user("alice@example.com");

    let warehouse_access = new_access(dataset_id, alice.clone(), Platform::Warehouse);
    repo.create_access(&warehouse_access).await.unwrap();

    assert_eq!(
        repo.find_active_access(dataset_id, &alice, Platform::Warehouse)
            .await
            .unwrap(),
        Some(warehouse_access)
    );
    assert_eq!(
        repo.find_active_access(dataset_id, &alice, Platform::BiTool)
            .await
            .unwrap(),
        None
    );
}

#[test_log::test(tokio::test)]
async fn test_revoked_accesses_leave_active_listings() {
    let repo = InMemoryAccessRepository::new();
    let dataset_id = DatasetID::new_random();

    let alice = new_access(dataset_id, Subject::user("alice@example.com"), Platform::BiTool);
    let everyone = new_access(dataset_id, Subject::all_users(), Platform::BiTool);
    let elsewhere = new_access(
        DatasetID::new_random(),
        Subject::user("alice@example.com"),
        Platform::BiTool,
    );
    for access in [&alice, &everyone, &elsewhere] {
        repo.create_access(access).await.unwrap();
    }

    repo.mark_access_revoked(alice.id, t0()).await.unwrap();

    assert_eq!(
        repo.list_active_accesses(dataset_id).await.unwrap(),
        vec![everyone.clone()]
    );
    assert_eq!(
        repo.list_all_active_accesses().await.unwrap(),
        vec![everyone, elsewhere]
    );
    assert_eq!(
        repo.get_access(alice.id).await.unwrap().revoked,
        Some(t0())
    );
}

#[test_log::test(tokio::test)]
async fn test_revoke_twice_is_rejected() {
    let repo = InMemoryAccessRepository::new();
    let access = new_access(
        DatasetID::new_random(),
        Subject::group("team-b@example.com"),
        Platform::Warehouse,
    );
    repo.create_access(&access).await.unwrap();

    repo.mark_access_revoked(access.id, t0()).await.unwrap();
    assert_matches!(
        repo.mark_access_revoked(access.id, t0()).await,
        Err(MarkAccessRevokedError::AlreadyRevoked(_))
    );
    assert_matches!(
        repo.mark_access_revoked(AccessID::new_random(), t0()).await,
        Err(MarkAccessRevokedError::NotFound(_))
    );
    assert_matches!(
        repo.get_access(AccessID::new_random()).await,
        Err(GetAccessError::NotFound(_))
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
