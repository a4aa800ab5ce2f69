// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::time::Duration;

use assert_matches::assert_matches;
use nada_datasets::DatasetID;
use nada_integrations::*;
use nada_platform_apis::{BiToolApi, ServiceAccountApi};
use pretty_assertions::assert_eq;
use time_source::SystemTimeSource;

use super::harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn kinds(statuses: &[WorkflowStatus]) -> Vec<WorkflowKind> {
    statuses.iter().map(|s| s.workflow.kind).collect()
}

#[test_log::test(tokio::test)]
async fn test_map_dataset_drives_integration_lifecycle() {
    let harness = IntegrationHarness::new();
    let dataset = harness.add_dataset("Orders", "orders").await;
    let service = &harness.integration_service;

    // Wanted, not shared with everyone
    let statuses = service
        .map_dataset(dataset.id, vec![ThirdPartyService::BiTool])
        .await
        .unwrap();
    assert_eq!(kinds(&statuses), vec![WorkflowKind::CreateRestricted]);
    statuses.iter().for_each(assert_finished);
    assert_eq!(
        harness.mapping_repo.get_mapping(dataset.id).await.unwrap(),
        Some(ThirdPartyMapping {
            dataset_id: dataset.id,
            services: vec![ThirdPartyService::BiTool],
        })
    );

    // Already in place
    let statuses = service
        .map_dataset(dataset.id, vec![ThirdPartyService::BiTool])
        .await
        .unwrap();
    assert_eq!(kinds(&statuses), vec![WorkflowKind::CreateRestricted]);
    assert!(statuses[0].workflow.jobs.iter().all(|j| j.duplicate));

    // Shared with everyone: opened in place
    let all_users = harness.share_with_all_users(dataset.id).await;
    let statuses = service
        .map_dataset(dataset.id, vec![ThirdPartyService::BiTool])
        .await
        .unwrap();
    assert_eq!(
        kinds(&statuses),
        vec![WorkflowKind::OpenRestricted, WorkflowKind::CreateOpen]
    );
    statuses.iter().for_each(assert_finished);
    assert!(harness.metadata(dataset.id).await.unwrap().is_open());

    // Opening is one way: revoking all-users access keeps the open database
    harness.revoke(&all_users).await;
    let statuses = service
        .map_dataset(dataset.id, vec![ThirdPartyService::BiTool])
        .await
        .unwrap();
    assert_eq!(kinds(&statuses), vec![WorkflowKind::CreateOpen]);

    // No longer wanted
    let statuses = service.map_dataset(dataset.id, vec![]).await.unwrap();
    assert_eq!(kinds(&statuses), vec![WorkflowKind::DeleteOpen]);
    statuses.iter().for_each(assert_finished);
    assert_eq!(harness.metadata(dataset.id).await, None);

    let statuses = service.map_dataset(dataset.id, vec![]).await.unwrap();
    assert_eq!(statuses, vec![]);
}

#[test_log::test(tokio::test)]
async fn test_map_dataset_stops_after_failed_workflow() {
    let harness = IntegrationHarness::new();
    harness.bi_tool.set_auto_sync(false);
    let dataset = harness.add_dataset("Orders", "orders").await;
    harness.share_with_all_users(dataset.id).await;

    let statuses = harness
        .integration_service
        .map_dataset(dataset.id, vec![ThirdPartyService::BiTool])
        .await
        .unwrap();
    assert_eq!(kinds(&statuses), vec![WorkflowKind::CreateOpen]);
    assert!(statuses[0].has_failed);
    assert_eq!(
        statuses[0].workflow.current_job().unwrap().kind,
        JobKind::Verify
    );
}

#[test_log::test(tokio::test)]
async fn test_map_unknown_dataset() {
    let harness = IntegrationHarness::new();
    let dataset_id = DatasetID::new_random();

    assert_matches!(
        harness
            .integration_service
            .map_dataset(dataset_id, vec![ThirdPartyService::BiTool])
            .await,
        Err(MapDatasetError::DatasetNotFound(e)) if e.dataset_id == dataset_id
    );
    assert_eq!(
        harness.mapping_repo.get_mapping(dataset_id).await.unwrap(),
        None
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_one_running_workflow_per_dataset() {
    let harness = IntegrationHarness::new();
    let busy = harness.add_dataset("Orders", "orders").await;
    let idle = harness.add_dataset("Customers", "customers").await;

    // Invocation of another process that has not finished yet
    let running = Workflow::new(
        WorkflowKind::DeleteRestricted,
        busy.id,
        harness.time_source.now(),
        None,
    );
    harness.workflow_repo.start_workflow(&running).await.unwrap();

    assert_matches!(
        harness
            .integration_service
            .run_workflow(busy.id, WorkflowKind::CreateRestricted)
            .await,
        Err(RunWorkflowError::AlreadyRunning(e))
            if e.dataset_id == busy.id && e.running_kind == WorkflowKind::DeleteRestricted
    );
    assert_matches!(
        harness
            .integration_service
            .map_dataset(busy.id, vec![ThirdPartyService::BiTool])
            .await,
        Err(MapDatasetError::AlreadyRunning(_))
    );
    assert_eq!(harness.metadata(busy.id).await, None);

    assert_finished(&harness.run(idle.id, WorkflowKind::CreateRestricted).await);
}

#[test_log::test(tokio::test)]
async fn test_workflow_status_reflects_latest_invocation() {
    let harness = IntegrationHarness::new();
    harness.bi_tool.set_auto_sync(false);
    let dataset = harness.add_dataset("Orders", "orders").await;
    let service = &harness.integration_service;

    assert_eq!(
        service
            .get_workflow_status(dataset.id, WorkflowKind::CreateRestricted)
            .await
            .unwrap(),
        None
    );

    let failed = harness.run(dataset.id, WorkflowKind::CreateRestricted).await;
    let status = service
        .get_workflow_status(dataset.id, WorkflowKind::CreateRestricted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status, failed);
    assert!(status.has_failed);
    assert!(!status.is_completed);

    let metadata = harness.metadata(dataset.id).await.unwrap();
    harness
        .bi_tool
        .sync_database(metadata.database_id().unwrap())
        .await
        .unwrap();
    harness.run(dataset.id, WorkflowKind::CreateRestricted).await;

    let status = service
        .get_workflow_status(dataset.id, WorkflowKind::CreateRestricted)
        .await
        .unwrap()
        .unwrap();
    assert!(!status.has_failed);
    assert!(status.is_completed);
    assert_eq!(status.workflow.attempt, 2);
    assert_eq!(
        service.find_metadata(dataset.id).await.unwrap(),
        harness.metadata(dataset.id).await
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_map_dataset_finishes_interrupted_deletion() {
    let harness = IntegrationHarness::new();
    let (dataset, mut metadata) = harness.restricted("Orders", "orders").await;
    harness
        .mapping_repo
        .set_mapping(&ThirdPartyMapping {
            dataset_id: dataset.id,
            services: vec![],
        })
        .await
        .unwrap();

    // Deletion stopped after removing the database and the service account
    metadata.mark_deleted(harness.time_source.now());
    harness
        .bi_tool
        .delete_database(metadata.database_id().unwrap())
        .await
        .unwrap();
    metadata.clear_database();
    harness
        .service_accounts
        .delete_service_account(metadata.service_account_email().unwrap())
        .await
        .unwrap();
    metadata.clear_service_account();
    harness.metadata_repo.update_metadata(&metadata).await.unwrap();

    let statuses = harness
        .integration_service
        .map_dataset(dataset.id, vec![ThirdPartyService::BiTool])
        .await
        .unwrap();
    assert_eq!(
        kinds(&statuses),
        vec![WorkflowKind::DeleteRestricted, WorkflowKind::CreateRestricted]
    );
    statuses.iter().for_each(assert_finished);

    let metadata = harness.metadata(dataset.id).await.unwrap();
    assert!(metadata.is_restricted());
    assert!(metadata.is_sync_completed());
    assert_eq!(metadata.deleted_at(), None);
    assert_eq!(harness.bi_tool.databases().len(), 1);
    assert_eq!(harness.service_accounts.accounts().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_create_rejects_row_being_deleted() {
    let harness = IntegrationHarness::new();
    let (dataset, mut metadata) = harness.restricted("Orders", "orders").await;
    metadata.mark_deleted(harness.time_source.now());
    harness.metadata_repo.update_metadata(&metadata).await.unwrap();

    let status = harness.run(dataset.id, WorkflowKind::CreateRestricted).await;
    assert!(status.has_failed);
    assert_eq!(
        status.workflow.current_job().unwrap().kind,
        JobKind::PreflightCheck
    );
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_cancelled_step_releases_dataset() {
    let harness = IntegrationHarness::new();
    let dataset = harness.add_dataset("Orders", "orders").await;

    cancel_during_key_encryption(&harness, dataset.id).await;
    wait_until_released(&harness, dataset.id).await;

    let interrupted = harness
        .workflow_repo
        .get_latest_workflow(dataset.id, WorkflowKind::CreateRestricted)
        .await
        .unwrap()
        .unwrap();
    assert!(interrupted.has_failed());
    let job = interrupted.current_job().unwrap();
    assert_eq!(job.kind, JobKind::ServiceAccountKey);
    assert_eq!(job.state, JobState::Failed);
    assert_eq!(job.errors.len(), 1);
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_map_dataset_retries_after_cancelled_step() {
    let harness = IntegrationHarness::new();
    let dataset = harness.add_dataset("Orders", "orders").await;

    cancel_during_key_encryption(&harness, dataset.id).await;
    wait_until_released(&harness, dataset.id).await;

    harness.kms.set_encrypt_hangs(false);
    let statuses = harness
        .integration_service
        .map_dataset(dataset.id, vec![ThirdPartyService::BiTool])
        .await
        .unwrap();

    assert_eq!(kinds(&statuses), vec![WorkflowKind::CreateRestricted]);
    assert_finished(&statuses[0]);
    assert_eq!(statuses[0].workflow.attempt, 2);
    assert!(harness.metadata(dataset.id).await.unwrap().is_sync_completed());
}

#[test_log::test(tokio::test)]
async fn test_stale_workflow_of_lost_process_is_released() {
    let harness = IntegrationHarness::new();
    let dataset = harness.add_dataset("Orders", "orders").await;

    // Started by a process that is gone
    let mut abandoned = Workflow::new(
        WorkflowKind::CreateRestricted,
        dataset.id,
        harness.time_source.now(),
        None,
    );
    harness.workflow_repo.start_workflow(&abandoned).await.unwrap();
    abandoned
        .current_job_mut()
        .unwrap()
        .start(harness.time_source.now())
        .unwrap();
    harness.workflow_repo.save_workflow(&abandoned).await.unwrap();

    // Too recent to tell apart from a slow run
    harness.time_source.advance(Duration::from_secs(60));
    assert_matches!(
        harness
            .integration_service
            .run_workflow(dataset.id, WorkflowKind::CreateRestricted)
            .await,
        Err(RunWorkflowError::AlreadyRunning(_))
    );

    harness
        .time_source
        .advance(harness.config.abandoned_workflow_after);
    let status = harness.run(dataset.id, WorkflowKind::CreateRestricted).await;
    assert_finished(&status);
    assert_eq!(status.workflow.attempt, 2);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Starts mapping the dataset with a KMS that never answers and gives up
/// after a second, like the mapping queue worker does at its deadline
async fn cancel_during_key_encryption(harness: &IntegrationHarness, dataset_id: DatasetID) {
    harness.kms.set_encrypt_hangs(true);

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        harness
            .integration_service
            .map_dataset(dataset_id, vec![ThirdPartyService::BiTool]),
    )
    .await;
    assert_matches!(result, Err(_));
}

async fn wait_until_released(harness: &IntegrationHarness, dataset_id: DatasetID) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness
            .workflow_repo
            .find_running_workflow(dataset_id)
            .await
            .unwrap()
            .is_some()
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
