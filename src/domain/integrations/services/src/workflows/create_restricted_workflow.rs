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
use internal_error::ResultIntoInternal;
use nada_datasets::{Dataset, DatasetID};
use nada_integrations::*;
use nada_platform_apis::*;
use secrecy::{ExposeSecret, SecretString};

use crate::{IntegrationSteps, StepOutcome, WorkflowDefinition, has_binding, unsupported_step};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Provisions a BI-tool database visible only to members of a per-dataset
/// permission group, queried through a per-dataset service account
pub struct CreateRestrictedWorkflow {
    steps: Arc<IntegrationSteps>,
}

#[component(pub)]
#[interface(dyn WorkflowDefinition)]
#[scope(Singleton)]
impl CreateRestrictedWorkflow {
    pub fn new(steps: Arc<IntegrationSteps>) -> Self {
        Self { steps }
    }

    async fn preflight_check(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        self.steps.get_dataset(dataset_id).await?;

        let metadata = self.steps.find_metadata(dataset_id).await?;
        if let Some(deleted_at) = metadata.as_ref().and_then(IntegrationMetadata::deleted_at) {
            return Err(StepError::validation(format!(
                "integration of dataset '{dataset_id}' is being deleted since {deleted_at}"
            )));
        }
        if metadata.as_ref().is_some_and(IntegrationMetadata::is_open) {
            return Err(StepError::validation(format!(
                "dataset '{dataset_id}' is already integrated as an open database"
            )));
        }

        if self.steps.is_shared_with_all_users(dataset_id).await? {
            return Err(StepError::validation(format!(
                "dataset '{dataset_id}' is shared with all users and must be integrated as an \
                 open database"
            )));
        }

        if metadata.is_some() {
            return Ok(StepOutcome::AlreadyDone);
        }

        self.steps
            .create_metadata(&IntegrationMetadata::new_restricted(dataset_id))
            .await?;
        Ok(StepOutcome::Performed)
    }

    async fn permission_group(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let mut metadata = self.steps.get_metadata(dataset_id).await?;
        if metadata.permission_group_id().is_some() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let dataset = self.steps.get_dataset(dataset_id).await?;

        let existing = self
            .steps
            .bi_tool
            .list_permission_groups()
            .await?
            .into_iter()
            .find(|g| g.name == dataset.slug);
        let group = match existing {
            Some(group) => group,
            None => {
                self.steps
                    .bi_tool
                    .create_permission_group(&dataset.slug)
                    .await?
            }
        };

        metadata.record_permission_group(group.id)?;
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn collection(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let mut metadata = self.steps.get_metadata(dataset_id).await?;
        if metadata.collection_id().is_some() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let group_id = metadata
            .permission_group_id()
            .ok_or_else(|| StepError::not_found(format!("permission group of '{dataset_id}'")))?;
        let dataset = self.steps.get_dataset(dataset_id).await?;

        let bi_tool = &self.steps.bi_tool;
        let description = collection_description(&dataset);
        let existing = bi_tool
            .list_collections()
            .await?
            .into_iter()
            .find(|c| !c.archived && c.description == description);
        let collection = match existing {
            Some(collection) => collection,
            None => {
                bi_tool
                    .create_collection(&format!("{} (restricted)", dataset.name), &description)
                    .await?
            }
        };
        bi_tool
            .set_collection_access(collection.id, group_id, CollectionAccess::Write)
            .await?;
        bi_tool
            .set_collection_access(
                collection.id,
                PermissionGroupID::ALL_USERS,
                CollectionAccess::None,
            )
            .await?;

        metadata.record_collection(collection.id)?;
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn service_account(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let mut metadata = self.steps.get_metadata(dataset_id).await?;
        if metadata.service_account_email().is_some() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let dataset = self.steps.get_dataset(dataset_id).await?;

        let account = self
            .steps
            .service_accounts
            .ensure_service_account(&NewServiceAccount {
                project_id: self.steps.config.gcp_project.clone(),
                account_id: restricted_service_account_id(dataset_id),
                display_name: dataset.name.clone(),
                description: format!(
                    "BI-tool access to {}",
                    dataset.datasource.table_ref()
                ),
            })
            .await?;

        metadata.record_service_account(account.email)?;
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn service_account_key(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let mut metadata = self.steps.get_metadata(dataset_id).await?;
        if metadata.encrypted_private_key().is_some()
            || metadata.is_key_wiped()
            || metadata.database_id().is_some()
        {
            return Ok(StepOutcome::AlreadyDone);
        }

        let email = require_service_account(&metadata)?;

        let key = self
            .steps
            .service_accounts
            .create_service_account_key(&email)
            .await?;
        let ciphertext = self
            .steps
            .kms
            .encrypt(
                &self.steps.config.kms_key_id,
                key.private_key_data.expose_secret().as_bytes(),
            )
            .await?;

        metadata.record_encrypted_private_key(ciphertext)?;
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }

    async fn project_iam(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let metadata = self.steps.get_metadata(dataset_id).await?;
        let member = service_account_member(&require_service_account(&metadata)?);

        let config = &self.steps.config;
        let bindings = self
            .steps
            .resource_manager
            .list_project_bindings(&config.gcp_project)
            .await?;
        if has_binding(&bindings, &config.dataset_management_role, &member) {
            return Ok(StepOutcome::AlreadyDone);
        }

        self.steps
            .resource_manager
            .add_project_binding(&config.gcp_project, &config.dataset_management_role, &member)
            .await?;
        Ok(StepOutcome::Performed)
    }

    async fn database(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let mut metadata = self.steps.get_metadata(dataset_id).await?;
        if metadata.database_id().is_some() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let email = require_service_account(&metadata)?;
        let ciphertext = metadata.encrypted_private_key().ok_or_else(|| {
            StepError::not_found(format!("encrypted service account key of '{dataset_id}'"))
        })?;
        let dataset = self.steps.get_dataset(dataset_id).await?;

        self.steps
            .ensure_table_reader(
                &dataset.datasource.table_ref(),
                &service_account_member(&email),
            )
            .await?;

        let database = match self.steps.find_unrecorded_database(&dataset, &email).await? {
            Some(database) => database,
            None => {
                let plaintext = self
                    .steps
                    .kms
                    .decrypt(&self.steps.config.kms_key_id, ciphertext)
                    .await?;
                let private_key = String::from_utf8(plaintext).int_err()?;

                self.steps
                    .bi_tool
                    .create_database(NewBiToolDatabase {
                        name: dataset.name,
                        project_id: dataset.datasource.project_id,
                        dataset: dataset.datasource.dataset,
                        service_account_email: email,
                        service_account_key: SecretString::from(private_key),
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
        let group_id = metadata
            .permission_group_id()
            .ok_or_else(|| StepError::not_found(format!("permission group of '{dataset_id}'")))?;
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
            .restrict_database_access(database_id, group_id)
            .await?;

        for email in self.steps.bi_tool_user_emails(dataset_id).await? {
            self.steps
                .bi_tool
                .add_member_by_email(group_id, &email)
                .await?;
        }

        metadata.wipe_private_key();
        metadata.mark_sync_completed(self.steps.now());
        self.steps.save_metadata(&metadata).await?;
        Ok(StepOutcome::Performed)
    }
}

#[async_trait::async_trait]
impl WorkflowDefinition for CreateRestrictedWorkflow {
    fn workflow_kind(&self) -> WorkflowKind {
        WorkflowKind::CreateRestricted
    }

    async fn run_step(
        &self,
        step: JobKind,
        dataset_id: DatasetID,
    ) -> Result<StepOutcome, StepError> {
        match step {
            JobKind::PreflightCheck => self.preflight_check(dataset_id).await,
            JobKind::PermissionGroup => self.permission_group(dataset_id).await,
            JobKind::Collection => self.collection(dataset_id).await,
            JobKind::ServiceAccount => self.service_account(dataset_id).await,
            JobKind::ServiceAccountKey => self.service_account_key(dataset_id).await,
            JobKind::ProjectIam => self.project_iam(dataset_id).await,
            JobKind::Database => self.database(dataset_id).await,
            JobKind::Verify => self.steps.verify_synced(dataset_id).await,
            JobKind::Finalize => self.finalize(dataset_id).await,
            _ => Err(unsupported_step(self.workflow_kind(), step)),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn require_service_account(metadata: &IntegrationMetadata) -> Result<String, StepError> {
    metadata
        .service_account_email()
        .map(ToString::to_string)
        .ok_or_else(|| {
            StepError::not_found(format!(
                "service account of '{}'",
                metadata.dataset_id()
            ))
        })
}

/// Stable across reruns so a recreated collection is recognizable
pub fn collection_description(dataset: &Dataset) -> String {
    format!(
        "Restricted collection for {}. Dataset: {}, dataproduct: {}",
        dataset.datasource.table_ref(),
        dataset.id,
        dataset.dataproduct_id,
    )
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
