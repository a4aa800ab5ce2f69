// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_utils::{BackgroundAgent, CancellationToken};
use nada_datasets::DatasetID;
use nada_integrations::*;
use nada_integrations_services::MappingQueueImpl;

use super::harness::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_worker_maps_enqueued_datasets() {
    let harness = IntegrationHarness::new();
    let restricted = harness.add_dataset("Orders", "orders").await;
    let open = harness.add_dataset("Customers", "customers").await;
    harness.share_with_all_users(open.id).await;

    let queue = harness.catalog.get_one::<dyn MappingQueue>().unwrap();
    let worker = harness.catalog.get_one::<MappingQueueImpl>().unwrap();

    let shutdown = CancellationToken::new();
    let worker_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    // Unknown dataset is logged and skipped
    for dataset_id in [DatasetID::new_random(), restricted.id, open.id] {
        queue
            .enqueue(MappingRequest {
                dataset_id,
                services: vec![ThirdPartyService::BiTool],
            })
            .await
            .unwrap();
    }

    wait_until_completed(&harness, open.id).await;
    wait_until_completed(&harness, restricted.id).await;

    assert!(harness.metadata(restricted.id).await.unwrap().is_restricted());
    assert!(harness.metadata(open.id).await.unwrap().is_open());

    shutdown.cancel();
    worker_handle.await.unwrap().unwrap();
}

#[test_log::test(tokio::test)]
async fn test_try_enqueue_fails_when_full() {
    let harness = IntegrationHarness::new_with_queue_config(MappingQueueConfig {
        capacity: 1,
        item_deadline: Duration::from_secs(60),
    });
    let queue = harness.catalog.get_one::<dyn MappingQueue>().unwrap();

    let request = |dataset_id| MappingRequest {
        dataset_id,
        services: vec![ThirdPartyService::BiTool],
    };

    assert_matches!(queue.try_enqueue(request(DatasetID::new_random())), Ok(()));
    assert_matches!(
        queue.try_enqueue(request(DatasetID::new_random())),
        Err(EnqueueMappingError::Full)
    );
}

#[test_log::test(tokio::test)]
async fn test_worker_stops_on_shutdown() {
    let harness = IntegrationHarness::new();
    let worker: Arc<MappingQueueImpl> = harness.catalog.get_one().unwrap();

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), worker.run(shutdown))
        .await
        .unwrap()
        .unwrap();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_worker_stops_on_shutdown_while_mapping() {
    let harness = IntegrationHarness::new();
    let dataset = harness.add_dataset("Orders", "orders").await;
    harness.kms.set_encrypt_hangs(true);

    let queue = harness.catalog.get_one::<dyn MappingQueue>().unwrap();
    let worker = harness.catalog.get_one::<MappingQueueImpl>().unwrap();

    let shutdown = CancellationToken::new();
    let worker_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    queue
        .enqueue(MappingRequest {
            dataset_id: dataset.id,
            services: vec![ThirdPartyService::BiTool],
        })
        .await
        .unwrap();

    // Stuck on the service account key, well before the item deadline
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(
        harness
            .workflow_repo
            .find_running_workflow(dataset.id)
            .await
            .unwrap()
            .is_some()
    );

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), worker_handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_worker_releases_dataset_after_deadline() {
    let harness = IntegrationHarness::new_with_queue_config(MappingQueueConfig {
        capacity: 10,
        item_deadline: Duration::from_secs(2),
    });
    let dataset = harness.add_dataset("Orders", "orders").await;
    harness.kms.set_encrypt_hangs(true);

    let queue = harness.catalog.get_one::<dyn MappingQueue>().unwrap();
    let worker = harness.catalog.get_one::<MappingQueueImpl>().unwrap();

    let shutdown = CancellationToken::new();
    let worker_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    let request = || MappingRequest {
        dataset_id: dataset.id,
        services: vec![ThirdPartyService::BiTool],
    };
    queue.enqueue(request()).await.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    harness.kms.set_encrypt_hangs(false);
    queue.enqueue(request()).await.unwrap();

    wait_until_completed(&harness, dataset.id).await;
    let status = harness
        .integration_service
        .get_workflow_status(dataset.id, WorkflowKind::CreateRestricted)
        .await
        .unwrap()
        .unwrap();
    assert!(status.is_completed);
    assert_eq!(status.workflow.attempt, 2);

    shutdown.cancel();
    worker_handle.await.unwrap().unwrap();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

async fn wait_until_completed(harness: &IntegrationHarness, dataset_id: DatasetID) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let done = harness
                .metadata(dataset_id)
                .await
                .is_some_and(|m| m.is_sync_completed());
            if done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
