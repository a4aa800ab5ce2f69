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
use nada_datasets::DatasetID;
use nada_integrations::*;
use nada_platform_apis::*;

use crate::{IntegrationSteps, StepOutcome, WorkflowDefinition, unsupported_step};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Inverse of [`crate::CreateRestrictedWorkflow`]. Every step treats an
/// already absent resource as done, so the workflow also cleans up after a
/// partially provisioned integration.
pub struct DeleteRestrictedWorkflow {
    steps: Arc<IntegrationSteps>,
}

#[component(pub)]
#[interface(dyn WorkflowDefinition)]
#[scope(Singleton)]
impl DeleteRestrictedWorkflow {
    pub fn new(steps: Arc<IntegrationSteps>) -> Self {
        Self { steps }
    }

    async fn load(&self, dataset_id: DatasetID) -> Result<Option<IntegrationMetadata>, StepError> {
        match self.steps.find_metadata(dataset_id).await? {
            Some(metadata) if metadata.is_open() => Err(StepError::validation(format!(
                "dataset '{dataset_id}' is integrated as an open database"
            ))),
            metadata => Ok(metadata),
        }
    }

    async fn revoke_warehouse_grant(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };

        let mut outcome = StepOutcome::AlreadyDone;
        if metadata.deleted_at().is_none() {
            metadata.mark_deleted(self.steps.now());
            self.steps.save_metadata(&metadata).await?;
            outcome = StepOutcome::Performed;
        }

        if let Some(email) = metadata.service_account_email() {
            let dataset = self.steps.get_dataset(dataset_id).await?;
            let removed = self
                .steps
                .remove_table_reader(
                    &dataset.datasource.table_ref(),
                    &service_account_member(email),
                )
                .await?;
            if removed {
                outcome = StepOutcome::Performed;
            }
        }

        Ok(outcome)
    }

    async fn delete_database(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let Some(database_id) = metadata.database_id() else {
            return Ok(StepOutcome::AlreadyDone);
        };

        self.steps
            .bi_tool
            .delete_database(database_id)
            .await
            .ignore_not_found()?;

        metadata.clear_database();
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn archive_collection(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let Some(collection_id) = metadata.collection_id() else {
            return Ok(StepOutcome::AlreadyDone);
        };

        self.steps
            .bi_tool
            .archive_collection(collection_id)
            .await
            .ignore_not_found()?;

        metadata.clear_collection();
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn remove_project_iam(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let Some(metadata) = self.load(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let Some(email) = metadata.service_account_email() else {
            return Ok(StepOutcome::AlreadyDone);
        };

        if self
            .steps
            .remove_management_binding(&service_account_member(email))
            .await?
        {
            Ok(StepOutcome::Performed)
        } else {
            Ok(StepOutcome::AlreadyDone)
        }
    }

    async fn delete_service_account(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let Some(email) = metadata.service_account_email().map(ToString::to_string) else {
            return Ok(StepOutcome::AlreadyDone);
        };

        self.steps
            .service_accounts
            .delete_service_account(&email)
            .await
            .ignore_not_found()?;

        metadata.clear_service_account();
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn delete_permission_group(
        &self,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let Some(group_id) = metadata.permission_group_id() else {
            return Ok(StepOutcome::AlreadyDone);
        };

        self.steps
            .bi_tool
            .delete_permission_group(group_id)
            .await
            .ignore_not_found()?;

        metadata.clear_permission_group();
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn delete_metadata(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        if self.load(dataset_id).await?.is_none() {
            return Ok(StepOutcome::AlreadyDone);
        }
        self.steps.delete_metadata(dataset_id).await
    }
}

#[async_trait::async_trait]
impl WorkflowDefinition for DeleteRestrictedWorkflow {
    fn workflow_kind(&self) -> WorkflowKind {
        WorkflowKind::DeleteRestricted
    }

    async fn run_step(
        &self,
        step: JobKind,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        match step {
            JobKind::RevokeWarehouseGrant => self.revoke_warehouse_grant(dataset_id).await,
            JobKind::DeleteDatabase => self.delete_database(dataset_id).await,
            JobKind::ArchiveCollection => self.archive_collection(dataset_id).await,
            JobKind::RemoveProjectIam => self.remove_project_iam(dataset_id).await,
            JobKind::DeleteServiceAccount => self.delete_service_account(dataset_id).await,
            JobKind::DeletePermissionGroup => self.delete_permission_group(dataset_id).await,
            JobKind::DeleteMetadata => self.delete_metadata(dataset_id).await,
            _ => Err(unsupported_step(self.workflow_kind(), step)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
