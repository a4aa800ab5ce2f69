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

/// Turns a restricted integration into an open one in place, keeping the
/// BI-tool database. Once the row is open every step is a no-op.
pub struct OpenRestrictedWorkflow {
    steps: Arc<IntegrationSteps>,
}

#[component(pub)]
#[interface(dyn WorkflowDefinition)]
#[scope(Singleton)]
impl OpenRestrictedWorkflow {
    pub fn new(steps: Arc<IntegrationSteps>) -> Self {
        Self { steps }
    }

    /// `None` when the integration is already open
    async fn load_restricted(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<IntegrationMetadata>, StepError> {
        let metadata = self.steps.get_metadata(dataset_id).await?;
        Ok(Some(metadata).filter(IntegrationMetadata::is_restricted))
    }

    async fn grant_shared_service_account(
        &self,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        if self.load_restricted(dataset_id).await?.is_none() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let dataset = self.steps.get_dataset(dataset_id).await?;
        let granted = self
            .steps
            .ensure_table_reader(
                &dataset.datasource.table_ref(),
                &service_account_member(&self.steps.config.shared_service_account_email),
            )
            .await?;

        Ok(if granted {
            StepOutcome::Performed
        } else {
            StepOutcome::AlreadyDone
        })
    }

    async fn swap_database_credential(
        &self,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        let Some(metadata) = self.load_restricted(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let Some(database_id) = metadata.database_id() else {
            return Ok(StepOutcome::AlreadyDone);
        };

        let config = &self.steps.config;
        let database = self.steps.bi_tool.get_database(database_id).await?;
        if database.service_account_email == config.shared_service_account_email {
            return Ok(StepOutcome::AlreadyDone);
        }

        self.steps
            .bi_tool
            .update_database_credential(
                database_id,
                &config.shared_service_account_email,
                SecretString::from(config.shared_service_account_key.expose_secret().to_string()),
            )
            .await?;
        Ok(StepOutcome::Performed)
    }

    async fn delete_restricted_service_account(
        &self,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load_restricted(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let Some(email) = metadata.service_account_email().map(ToString::to_string) else {
            return Ok(StepOutcome::AlreadyDone);
        };
        let member = service_account_member(&email);

        self.steps.remove_management_binding(&member).await?;

        let dataset = self.steps.get_dataset(dataset_id).await?;
        self.steps
            .remove_table_reader(&dataset.datasource.table_ref(), &member)
            .await?;

        self.steps
            .service_accounts
            .delete_service_account(&email)
            .await
            .ignore_not_found()?;

        metadata.clear_service_account();
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn reset_to_open(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let Some(mut metadata) = self.load_restricted(dataset_id).await? else {
            return Ok(StepOutcome::AlreadyDone);
        };

        let bi_tool = &self.steps.bi_tool;
        if let Some(database_id) = metadata.database_id() {
            bi_tool.open_database_access(database_id).await?;
        }
        if let Some(group_id) = metadata.permission_group_id() {
            bi_tool
                .delete_permission_group(group_id)
                .await
                .ignore_not_found()?;
        }
        if let Some(collection_id) = metadata.collection_id() {
            bi_tool
                .archive_collection(collection_id)
                .await
                .ignore_not_found()?;
        }

        metadata.reset_to_open()?;
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }
}

#[async_trait::async_trait]
impl WorkflowDefinition for OpenRestrictedWorkflow {
    fn workflow_kind(&self) -> WorkflowKind {
        WorkflowKind::OpenRestricted
    }

    async fn run_step(
        &self,
        step: JobKind,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        match step {
            JobKind::GrantSharedServiceAccount => {
                self.grant_shared_service_account(dataset_id).await
            }
            JobKind::SwapDatabaseCredential => self.swap_database_credential(dataset_id).await,
            JobKind::DeleteRestrictedServiceAccount => {
                self.delete_restricted_service_account(dataset_id).await
            }
            JobKind::ResetToOpen => self.reset_to_open(dataset_id).await,
            _ => Err(unsupported_step(self.workflow_kind(), step)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
