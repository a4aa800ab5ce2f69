// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;

use dill::*;
use internal_error::InternalError;
use nada_access::{AccessRepository, Platform, Subject};
use nada_integrations::*;
use syncer::Runner;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Compares the desired third-party mappings with the integrations that exist
/// and enqueues every dataset that is not where it should be. Incomplete
/// integrations are re-enqueued on every run, which is how a pending Verify
/// gets retried.
pub struct MappingQueueProducer {
    mapping_repo: Arc<dyn ThirdPartyMappingRepository>,
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    access_repo: Arc<dyn AccessRepository>,
    queue: Arc<dyn MappingQueue>,
}

#[component(pub)]
#[interface(dyn Runner)]
#[scope(Singleton)]
impl MappingQueueProducer {
    pub fn new(
        mapping_repo: Arc<dyn ThirdPartyMappingRepository>,
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        access_repo: Arc<dyn AccessRepository>,
        queue: Arc<dyn MappingQueue>,
    ) -> Self {
        Self {
            mapping_repo,
            metadata_repo,
            access_repo,
            queue,
        }
    }

    async fn needs_mapping(&self, mapping: &ThirdPartyMapping) -> Result<bool, InternalError> {
        let metadata = self
            .metadata_repo
            .find_metadata(mapping.dataset_id)
            .await?;

        if !mapping.wants_bi_tool() {
            return Ok(metadata.is_some());
        }

        let Some(metadata) = metadata else {
            return Ok(true);
        };
        // Deletion stopped halfway, it is finished and the dataset provisioned
        // anew
        if metadata.deleted_at().is_some() {
            return Ok(true);
        }
        if !metadata.is_sync_completed() {
            return Ok(true);
        }
        if metadata.is_open() {
            return Ok(false);
        }

        let shared_with_all_users = self
            .access_repo
            .find_active_access(mapping.dataset_id, &Subject::all_users(), Platform::BiTool)
            .await?
            .is_some();
        Ok(shared_with_all_users)
    }
}

#[async_trait::async_trait]
impl Runner for MappingQueueProducer {
    fn runner_name(&self) -> &'static str {
        "mapping-queue-producer"
    }

    async fn run_once(&self) -> Result<(), InternalError> {
        let mut enqueued = 0;

        for mapping in self.mapping_repo.list_mappings().await? {
            if !self.needs_mapping(&mapping).await? {
                continue;
            }

            let request = MappingRequest {
                dataset_id: mapping.dataset_id,
                services: mapping.services,
            };
            match self.queue.try_enqueue(request) {
                Ok(()) => enqueued += 1,
                Err(EnqueueMappingError::Full) => {
                    tracing::warn!(enqueued, "Mapping queue is full, leaving the rest for later");
                    break;
                }
                Err(EnqueueMappingError::Closed) => {
                    return InternalError::bail("Mapping queue is closed");
                }
            }
        }

        tracing::debug!(enqueued, "Enqueued datasets for mapping");
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
