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

pub struct DeleteOpenWorkflow {
    steps: Arc<IntegrationSteps>,
}

#[component(pub)]
#[interface(dyn WorkflowDefinition)]
#[scope(Singleton)]
impl DeleteOpenWorkflow {
    pub fn new(steps: Arc<IntegrationSteps>) -> Self {
        Self { steps }
    }

    async fn load(&self, dataset_id: DatasetID) -> Result<Option<IntegrationMetadata>, StepError> {
        match self.steps.find_metadata(dataset_id).await? {
            Some(metadata) if metadata.is_restricted() => Err(StepError::validation(format!(
                "dataset '{dataset_id}' is integrated as a restricted database"
            ))),
            metadata => Ok(metadata),
        }
    }

    async fn revoke_shared_service_account_grant(
        &self,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };

        let mut outcome = StepOutcome::AlreadyDone;
        if metadata.deleted_at().is_none() {
            metadata.mark_deleted(self.steps.now());
            self.steps.save_metadata(&metadata).await?;
            outcome = StepOutcome::Performed;
        }

        let dataset = self.steps.get_dataset(dataset_id).await?;
        let removed = self
            .steps
            .remove_table_reader(
                &dataset.datasource.table_ref(),
                &service_account_member(&self.steps.config.shared_service_account_email),
            )
            .await?;
        if removed {
            outcome = StepOutcome::Performed;
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

    async fn delete_metadata(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        if self.load(dataset_id).await?.is_none() {
            return Ok(StepOutcome::AlreadyDone);
        }
        self.steps.delete_metadata(dataset_id).await
    }
}

#[async_trait::async_trait]
impl WorkflowDefinition for DeleteOpenWorkflow {
    fn workflow_kind(&self) -> WorkflowKind {
        WorkflowKind::DeleteOpen
    }

    async fn run_step(
        &self,
        step: JobKind,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        match step {
            JobKind::RevokeSharedServiceAccountGrant => {
                self.revoke_shared_service_account_grant(dataset_id).await
            }
            JobKind::DeleteDatabase => self.delete_database(dataset_id).await,
            JobKind::DeleteMetadata => self.delete_metadata(dataset_id).await,
            _ => Err(unsupported_step(self.workflow_kind(), step)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
