// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use nada_access::*;
use nada_access_inmem::InMemoryAccessRequestRepository;
use nada_datasets::DatasetID;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn new_request(dataset_id: DatasetID) -> AccessRequest {
    AccessRequest {
        id: AccessRequestID::new_random(),
        dataset_id,
        subject: Subject::user("alice@example.com"),
        owner: None,
        platform: Platform::Warehouse,
        polly_documentation: None,
        expires: None,
        status: AccessRequestStatus::Pending,
        created: Utc.with_ymd_and_hms(2050, 1, 1, 12, 0, 0).unwrap(),
        closed: None,
        granter: None,
        reason: None,
    }
}

#[test_log::test(tokio::test)]
async fn test_update_replaces_request() {
    let repo = InMemoryAccessRequestRepository::new();
    let dataset_id = DatasetID::new_random();

    let mut request = new_request(dataset_id);
    repo.create_access_request(&request).await.unwrap();

    request.status = AccessRequestStatus::Denied;
    request.reason = Some("No legal basis".to_string());
    repo.update_access_request(&request).await.unwrap();

    assert_eq!(repo.get_access_request(request.id).await.unwrap(), request);
    assert_eq!(
        repo.list_access_requests(dataset_id).await.unwrap(),
        vec![request]
    );
    assert!(
        repo.list_access_requests(DatasetID::new_random())
            .await
            .unwrap()
            .is_empty()
    );
}

#[test_log::test(tokio::test)]
async fn test_unknown_request_is_not_found() {
    let repo = InMemoryAccessRequestRepository::new();
    let request = new_request(DatasetID::new_random());

    assert_matches!(
        repo.update_access_request(&request).await,
        Err(GetAccessRequestError::NotFound(e)) if e.request_id == request.id
    );
    assert_matches!(
        repo.get_access_request(request.id).await,
        Err(GetAccessRequestError::NotFound(_))
    );
    assert!(repo.create_access_request(&request).await.is_ok());
    assert!(repo.create_access_request(&request).await.is_err());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
