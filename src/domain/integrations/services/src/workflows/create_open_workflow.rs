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
use secrecy::{ExposeSecret, SecretString};

use crate::{IntegrationSteps, StepOutcome, WorkflowDefinition, unsupported_step};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Provisions a BI-tool database readable by every BI-tool user, queried
/// through the shared service account
pub struct CreateOpenWorkflow {
    steps: Arc<IntegrationSteps>,
}

#[component(pub)]
#[interface(dyn WorkflowDefinition)]
#[scope(Singleton)]
impl CreateOpenWorkflow {
    pub fn new(steps: Arc<IntegrationSteps>) -> Self {
        Self { steps }
    }

    async fn preflight_check(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        self.steps.get_dataset(dataset_id).await?;

        match self.steps.find_metadata(dataset_id).await? {
            Some(metadata) if metadata.deleted_at().is_some() => Err(StepError::validation(format!(
                "integration of dataset '{dataset_id}' is being deleted"
            ))),
            Some(metadata) if metadata.is_restricted() => Err(StepError::validation(format!(
                "dataset '{dataset_id}' is integrated as a restricted database"
            ))),
            Some(_) => Ok(StepOutcome::AlreadyDone),
            None => {
                if !self.steps.is_shared_with_all_users(dataset_id).await? {
                    return Err(StepError::validation(format!(
                        "dataset '{dataset_id}' is not shared with all users"
                    )));
                }

                self.steps
                    .create_metadata(&IntegrationMetadata::new_open(dataset_id))
                    .await?;
                Ok(StepOutcome::Performed)
            }
        }
    }

    async fn database(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let mut metadata = self.steps.get_metadata(dataset_id).await?;
        if metadata.database_id().is_some() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let dataset = self.steps.get_dataset(dataset_id).await?;
        let config = &self.steps.config;

        self.steps
            .ensure_table_reader(
                &dataset.datasource.table_ref(),
                &service_account_member(&config.shared_service_account_email),
            )
            .await?;

        let existing = self
            .steps
            .find_unrecorded_database(&dataset, &config.shared_service_account_email)
            .await?;
        let database = match existing {
            Some(database) => database,
            None => {
                self.steps
                    .bi_tool
                    .create_database(NewBiToolDatabase {
                        name: dataset.name,
                        project_id: dataset.datasource.project_id,
                        dataset: dataset.datasource.dataset,
                        service_account_email: config.shared_service_account_email.clone(),
                        service_account_key: SecretString::from(
                            config.shared_service_account_key.expose_secret().to_string(),
                        ),
                    })
                    .await?
            }
        };

        metadata.record_database(database.id);
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn finalize(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let mut metadata = self.steps.get_metadata(dataset_id).await?;
        if metadata.is_sync_completed() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let database_id = metadata
            .database_id()
            .ok_or_else(|| StepError::not_found(format!("BI-tool database of '{dataset_id}'")))?;
        let dataset = self.steps.get_dataset(dataset_id).await?;

        let visible = self.steps.visible_tables(&dataset, &metadata).await?;
        self.steps
            .sync_table_visibility(database_id, &visible)
            .await?;
        self.steps
            .map_semantic_types(database_id, &dataset.datasource.table)
            .await?;

        self.steps
            .bi_tool
            .open_database_access(database_id)
            .await?;

        metadata.mark_sync_completed(self.steps.now());
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }
}

#[async_trait::async_trait]
impl WorkflowDefinition for CreateOpenWorkflow {
    fn workflow_kind(&self) -> WorkflowKind {
        WorkflowKind::CreateOpen
    }

    async fn run_step(
        &self,
        step: JobKind,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        match step {
            JobKind::PreflightCheck => self.preflight_check(dataset_id).await,
            JobKind::Database => self.database(dataset_id).await,
            JobKind::Verify => self.steps.verify_synced(dataset_id).await,
            JobKind::Finalize => self.finalize(dataset_id).await,
            _ => Err(unsupported_step(self.workflow_kind(), step)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
