// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use nada_access::Subject;
use nada_integrations::*;
use nada_platform_apis::*;
use pretty_assertions::assert_eq;

use super::harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_delete_restricted_removes_all_resources() {
    let harness = IntegrationHarness::new();
    let dataset = harness.add_dataset("Orders", "orders").await;
    harness
        .grant_bi_tool(dataset.id, Subject::user("jane@nav.no"))
        .await;
    assert_finished(&harness.run(dataset.id, WorkflowKind::CreateRestricted).await);

    let metadata = harness.metadata(dataset.id).await.unwrap();
    let collection_id = metadata.collection_id().unwrap();
    let sa_member = service_account_member(metadata.service_account_email().unwrap());

    let status = harness.run(dataset.id, WorkflowKind::DeleteRestricted).await;
    assert_finished(&status);
    assert!(status.is_completed);
    assert!(status.workflow.jobs.iter().all(|j| !j.duplicate));

    assert_eq!(harness.metadata(dataset.id).await, None);
    assert_eq!(harness.bi_tool.databases(), vec![]);
    assert_eq!(
        harness
            .bi_tool
            .groups()
            .into_iter()
            .map(|g| g.id)
            .collect::<Vec<_>>(),
        vec![PermissionGroupID::ALL_USERS]
    );
    assert!(harness.bi_tool.collection(collection_id).unwrap().archived);
    assert_eq!(harness.service_accounts.accounts(), vec![]);
    assert_eq!(harness.management_members(), Vec::<String>::new());
    assert!(
        !harness
            .warehouse
            .has_reader(&dataset.datasource.table_ref(), &sa_member)
    );
}

#[test_log::test(tokio::test)]
async fn test_delete_restricted_cleans_up_partial_provisioning() {
    let harness = IntegrationHarness::new();
    harness.bi_tool.set_auto_sync(false);
    let dataset = harness.add_dataset("Orders", "orders").await;

    let create = harness.run(dataset.id, WorkflowKind::CreateRestricted).await;
    assert!(create.has_failed);

    let status = harness.run(dataset.id, WorkflowKind::DeleteRestricted).await;
    assert_finished(&status);

    assert_eq!(harness.metadata(dataset.id).await, None);
    assert_eq!(harness.bi_tool.databases(), vec![]);
    assert_eq!(harness.bi_tool.groups().len(), 1);
    assert_eq!(harness.service_accounts.accounts(), vec![]);
    assert_eq!(harness.management_members(), Vec::<String>::new());
}

#[test_log::test(tokio::test)]
async fn test_delete_restricted_rerun_is_noop() {
    let harness = IntegrationHarness::new();
    let (dataset, _) = harness.restricted("Orders", "orders").await;
    assert_finished(&harness.run(dataset.id, WorkflowKind::DeleteRestricted).await);
    let mutations = harness.total_mutations();

    let status = harness.run(dataset.id, WorkflowKind::DeleteRestricted).await;
    assert_finished(&status);
    assert!(status.is_completed);
    assert!(status.workflow.jobs.iter().all(|j| j.duplicate));
    assert_eq!(harness.total_mutations(), mutations);
}

#[test_log::test(tokio::test)]
async fn test_delete_restricted_survives_resources_removed_out_of_band() {
    let harness = IntegrationHarness::new();
    let (dataset, metadata) = harness.restricted("Orders", "orders").await;

    harness
        .bi_tool
        .delete_database(metadata.database_id().unwrap())
        .await
        .unwrap();
    harness
        .service_accounts
        .delete_service_account(metadata.service_account_email().unwrap())
        .await
        .unwrap();
    harness.warehouse.drop_table(&dataset.datasource.table_ref());

    let status = harness.run(dataset.id, WorkflowKind::DeleteRestricted).await;
    assert_finished(&status);
    assert_eq!(harness.metadata(dataset.id).await, None);
    assert_eq!(harness.management_members(), Vec::<String>::new());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_delete_open_removes_database_and_grant() {
    let harness = IntegrationHarness::new();
    let (dataset, _) = harness.open("Orders", "orders").await;

    let status = harness.run(dataset.id, WorkflowKind::DeleteOpen).await;
    assert_finished(&status);
    assert!(status.is_completed);

    assert_eq!(harness.metadata(dataset.id).await, None);
    assert_eq!(harness.bi_tool.databases(), vec![]);
    assert!(
        !harness
            .warehouse
            .has_reader(&dataset.datasource.table_ref(), &harness.shared_member())
    );
}

#[test_log::test(tokio::test)]
async fn test_delete_workflows_reject_mismatched_integration() {
    let harness = IntegrationHarness::new();
    let (restricted, restricted_metadata) = harness.restricted("Orders", "orders").await;
    let (open, open_metadata) = harness.open("Customers", "customers").await;

    let status = harness.run(restricted.id, WorkflowKind::DeleteOpen).await;
    assert!(status.has_failed);
    assert_eq!(
        job_kinds(&status),
        vec![(
            JobKind::RevokeSharedServiceAccountGrant,
            JobState::Failed,
            false
        )]
    );
    assert_eq!(
        harness.metadata(restricted.id).await,
        Some(restricted_metadata)
    );

    let status = harness.run(open.id, WorkflowKind::DeleteRestricted).await;
    assert!(status.has_failed);
    assert!(status.errors()[0].contains("open database"));
    assert_eq!(harness.metadata(open.id).await, Some(open_metadata));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
