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
use internal_error::{ErrorIntoInternal, InternalError, ResultIntoInternal};
use nada_datasets::{DatasetID, DatasetRepository, GetDatasetError};
use nada_integrations::*;
use nada_platform_apis::WarehouseApi;
use syncer::Runner;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Tears down integrations whose warehouse table no longer exists and clears
/// their desired mapping so they are not provisioned again
pub struct WarehouseMissingTablesRunner {
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    dataset_repo: Arc<dyn DatasetRepository>,
    warehouse: Arc<dyn WarehouseApi>,
    integration_service: Arc<dyn IntegrationService>,
}

#[component(pub)]
#[interface(dyn Runner)]
#[scope(Singleton)]
impl WarehouseMissingTablesRunner {
    pub fn new(
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        dataset_repo: Arc<dyn DatasetRepository>,
        warehouse: Arc<dyn WarehouseApi>,
        integration_service: Arc<dyn IntegrationService>,
    ) -> Self {
        Self {
            metadata_repo,
            dataset_repo,
            warehouse,
            integration_service,
        }
    }

    async fn is_table_missing(&self, dataset_id: DatasetID) -> Result<bool, InternalError> {
        let dataset = match self.dataset_repo.get_dataset(dataset_id).await {
            Ok(dataset) => dataset,
            Err(GetDatasetError::NotFound(_)) => return Ok(false),
            Err(GetDatasetError::Internal(e)) => return Err(e),
        };

        match self
            .warehouse
            .get_table(&dataset.datasource.table_ref())
            .await
        {
            Ok(_) => Ok(false),
            Err(e) if e.is_not_found() => Ok(true),
            Err(e) => Err(e.int_err()),
        }
    }

    async fn remove_integration(&self, dataset_id: DatasetID) -> Result<(), InternalError> {
        if !self.is_table_missing(dataset_id).await? {
            return Ok(());
        }

        tracing::warn!(%dataset_id, "Warehouse table is gone, removing BI-tool integration");

        let statuses = self
            .integration_service
            .map_dataset(dataset_id, vec![])
            .await
            .int_err()?;
        for status in statuses.iter().filter(|s| s.has_failed) {
            tracing::warn!(
                %dataset_id,
                workflow_kind = %status.workflow.kind,
                errors = ?status.errors(),
                "Removing integration failed"
            );
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl Runner for WarehouseMissingTablesRunner {
    fn runner_name(&self) -> &'static str {
        "warehouse-missing-tables"
    }

    async fn run_once(&self) -> Result<(), InternalError> {
        for metadata in self.metadata_repo.list_metadata().await? {
            let dataset_id = metadata.dataset_id();
            if let Err(e) = self.remove_integration(dataset_id).await {
                tracing::error!(
                    %dataset_id,
                    error = ?e,
                    error_msg = %e.reason(),
                    "Failed to check integration for a missing table"
                );
            }
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
