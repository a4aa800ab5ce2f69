// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dill::*;
use nada_access::{AccessRepository, Platform, Subject};
use nada_datasets::{Dataset, DatasetID, DatasetRepository, GetDatasetError};
use nada_integrations::*;
use nada_platform_apis::*;
use time_source::SystemTimeSource;

use crate::StepOutcome;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Collaborators and lookups shared by all workflow definitions
pub struct IntegrationSteps {
    dataset_repo: Arc<dyn DatasetRepository>,
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    access_repo: Arc<dyn AccessRepository>,
    pub(crate) bi_tool: Arc<dyn BiToolApi>,
    pub(crate) warehouse: Arc<dyn WarehouseApi>,
    pub(crate) service_accounts: Arc<dyn ServiceAccountApi>,
    pub(crate) resource_manager: Arc<dyn CloudResourceManagerApi>,
    pub(crate) kms: Arc<dyn KmsApi>,
    time_source: Arc<dyn SystemTimeSource>,
    pub(crate) config: Arc<IntegrationsConfig>,
}

#[component(pub)]
#[scope(Singleton)]
impl IntegrationSteps {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dataset_repo: Arc<dyn DatasetRepository>,
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        access_repo: Arc<dyn AccessRepository>,
        bi_tool: Arc<dyn BiToolApi>,
        warehouse: Arc<dyn WarehouseApi>,
        service_accounts: Arc<dyn ServiceAccountApi>,
        resource_manager: Arc<dyn CloudResourceManagerApi>,
        kms: Arc<dyn KmsApi>,
        time_source: Arc<dyn SystemTimeSource>,
        config: Arc<IntegrationsConfig>,
    ) -> Self {
        Self {
            dataset_repo,
            metadata_repo,
            access_repo,
            bi_tool,
            warehouse,
            service_accounts,
            resource_manager,
            kms,
            time_source,
            config,
        }
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.time_source.now()
    }

    pub(crate) async fn get_dataset(&self, dataset_id: DatasetID) -> Result<Dataset, StepError> {
        match self.dataset_repo.get_dataset(dataset_id).await {
            Ok(dataset) => Ok(dataset),
            Err(GetDatasetError::NotFound(e)) => Err(StepError::not_found(e.to_string())),
            Err(GetDatasetError::Internal(e)) => Err(e.into()),
        }
    }

    pub(crate) async fn find_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<IntegrationMetadata>, StepError> {
        Ok(self.metadata_repo.find_metadata(dataset_id).await?)
    }

    pub(crate) async fn get_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<IntegrationMetadata, StepError> {
        self.find_metadata(dataset_id).await?.ok_or_else(|| {
            StepError::not_found(format!("integration metadata of dataset '{dataset_id}'"))
        })
    }

    pub(crate) async fn create_metadata(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<(), StepError> {
        match self.metadata_repo.create_metadata(metadata).await {
            Ok(()) => Ok(()),
            Err(CreateIntegrationMetadataError::AlreadyExists(e)) => {
                Err(StepError::validation(e.to_string()))
            }
            Err(CreateIntegrationMetadataError::Internal(e)) => Err(e.into()),
        }
    }

    pub(crate) async fn save_metadata(&self, metadata: &IntegrationMetadata) -> Result<(), StepError> {
        match self.metadata_repo.update_metadata(metadata).await {
            Ok(()) => Ok(()),
            Err(UpdateIntegrationMetadataError::NotFound(e)) => {
                Err(StepError::not_found(e.to_string()))
            }
            Err(UpdateIntegrationMetadataError::Internal(e)) => Err(e.into()),
        }
    }

    pub(crate) async fn delete_metadata(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        match self.metadata_repo.delete_metadata(dataset_id).await {
            Ok(()) => Ok(StepOutcome::Performed),
            Err(DeleteIntegrationMetadataError::NotFound(_)) => Ok(StepOutcome::AlreadyDone),
            Err(DeleteIntegrationMetadataError::Internal(e)) => Err(e.into()),
        }
    }

    /// Database registered for the dataset by an earlier run that stopped
    /// before recording it. Databases recorded by any integration are never
    /// adopted.
    pub(crate) async fn find_unrecorded_database(
        &self,
        dataset: &Dataset,
        service_account_email: &str,
    ) -> Result<Option<BiToolDatabase>, StepError> {
        let recorded: BTreeSet<DatabaseID> = self
            .metadata_repo
            .list_metadata()
            .await?
            .iter()
            .filter_map(IntegrationMetadata::database_id)
            .collect();

        Ok(self
            .bi_tool
            .list_databases()
            .await?
            .into_iter()
            .find(|db| {
                !recorded.contains(&db.id)
                    && db.name == dataset.name
                    && db.project_id == dataset.datasource.project_id
                    && db.dataset == dataset.datasource.dataset
                    && db.service_account_email == service_account_email
            }))
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    pub(crate) async fn is_shared_with_all_users(
        &self,
        dataset_id: DatasetID,
    ) -> Result<bool, StepError> {
        let access = self
            .access_repo
            .find_active_access(dataset_id, &Subject::all_users(), Platform::BiTool)
            .await?;
        Ok(access.is_some())
    }

    /// Emails of users holding active BI-tool access to the dataset
    pub(crate) async fn bi_tool_user_emails(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Vec<String>, StepError> {
        let accesses = self.access_repo.list_active_accesses(dataset_id).await?;
        Ok(accesses
            .into_iter()
            .filter(|a| a.platform == Platform::BiTool && a.subject.is_user())
            .map(|a| a.subject.email)
            .collect())
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    /// Returns `false` if the member already had read access
    pub(crate) async fn ensure_table_reader(
        &self,
        table: &TableRef,
        member: &str,
    ) -> Result<bool, StepError> {
        let policy = self.warehouse.get_table_policy(table).await?;
        if policy.has_member(WAREHOUSE_DATA_VIEWER_ROLE, member) {
            return Ok(false);
        }

        self.warehouse.grant(table, member).await?;
        Ok(true)
    }

    /// Strips the member from every role of the table policy. A missing table
    /// counts as nothing to remove.
    pub(crate) async fn remove_table_reader(
        &self,
        table: &TableRef,
        member: &str,
    ) -> Result<bool, StepError> {
        let Some(mut policy) = self.warehouse.get_table_policy(table).await.ignore_not_found()?
        else {
            return Ok(false);
        };

        if !policy.remove_member(member) {
            return Ok(false);
        }

        self.warehouse
            .update_table_policy(table, policy)
            .await
            .ignore_not_found()?;
        Ok(true)
    }

    /// Returns `false` if the binding was not there
    pub(crate) async fn remove_management_binding(&self, member: &str) -> Result<bool, StepError> {
        let project_id = &self.config.gcp_project;
        let role = &self.config.dataset_management_role;

        let bindings = self
            .resource_manager
            .list_project_bindings(project_id)
            .await?;
        if !has_binding(&bindings, role, member) {
            return Ok(false);
        }

        self.resource_manager
            .remove_project_binding(project_id, role, member)
            .await
            .ignore_not_found()?;
        Ok(true)
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    pub(crate) async fn verify_synced(&self, dataset_id: DatasetID) -> Result<StepOutcome, StepError> {
        let metadata = self.get_metadata(dataset_id).await?;
        if metadata.is_sync_completed() {
            return Ok(StepOutcome::AlreadyDone);
        }

        let database_id = metadata.database_id().ok_or_else(|| {
            StepError::not_found(format!("BI-tool database of dataset '{dataset_id}'"))
        })?;
        let dataset = self.get_dataset(dataset_id).await?;

        let tables = self.bi_tool.list_tables(database_id).await?;
        let Some(table) = tables
            .iter()
            .find(|t| t.name == dataset.datasource.table)
        else {
            return Err(StepError::NotSynced {
                database_id,
                reason: format!("table '{}' is not discovered yet", dataset.datasource.table),
            });
        };

        if table.fields.is_empty() {
            return Err(StepError::NotSynced {
                database_id,
                reason: format!("table '{}' has no fields yet", table.name),
            });
        }

        Ok(StepOutcome::Performed)
    }

    /// Tables of the database that should stay visible: the dataset's own
    /// table, plus for open integrations the tables of other open datasets
    /// living in the same warehouse dataset
    pub(crate) async fn visible_tables(
        &self,
        dataset: &Dataset,
        metadata: &IntegrationMetadata,
    ) -> Result<BTreeSet<String>, StepError> {
        let mut visible = BTreeSet::from([dataset.datasource.table.clone()]);
        if metadata.is_restricted() {
            return Ok(visible);
        }

        let table_ref = dataset.datasource.table_ref();
        for other in self.metadata_repo.list_metadata().await? {
            if !other.is_open() || other.dataset_id() == dataset.id || other.deleted_at().is_some()
            {
                continue;
            }

            let other_dataset = match self.dataset_repo.get_dataset(other.dataset_id()).await {
                Ok(other_dataset) => other_dataset,
                Err(GetDatasetError::NotFound(_)) => continue,
                Err(GetDatasetError::Internal(e)) => return Err(e.into()),
            };

            if other_dataset.datasource.table_ref().same_dataset(&table_ref) {
                visible.insert(other_dataset.datasource.table);
            }
        }

        Ok(visible)
    }

    /// Hides every table not in `visible` and shows those that are. Only
    /// tables whose visibility differs are touched. Returns the number of
    /// changed tables.
    pub(crate) async fn sync_table_visibility(
        &self,
        database_id: DatabaseID,
        visible: &BTreeSet<String>,
    ) -> Result<usize, StepError> {
        let tables = self.bi_tool.list_tables(database_id).await?;

        let mut to_show = Vec::new();
        let mut to_hide = Vec::new();
        for table in &tables {
            let wanted = if visible.contains(&table.name) {
                TableVisibility::Visible
            } else {
                TableVisibility::Hidden
            };

            if table.visibility != wanted {
                match wanted {
                    TableVisibility::Visible => to_show.push(table.id),
                    TableVisibility::Hidden => to_hide.push(table.id),
                }
            }
        }

        if !to_hide.is_empty() {
            self.bi_tool
                .set_tables_visibility(&to_hide, TableVisibility::Hidden)
                .await?;
        }
        if !to_show.is_empty() {
            self.bi_tool
                .set_tables_visibility(&to_show, TableVisibility::Visible)
                .await?;
        }

        Ok(to_hide.len() + to_show.len())
    }

    /// Recomputes and applies visibility of a completed integration. Returns
    /// `None` when the integration is not completed yet.
    pub(crate) async fn resync_table_visibility(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<Option<usize>, StepError> {
        let Some(database_id) = metadata.database_id() else {
            return Ok(None);
        };
        if !metadata.is_sync_completed() || metadata.deleted_at().is_some() {
            return Ok(None);
        }

        let dataset = self.get_dataset(metadata.dataset_id()).await?;
        let visible = self.visible_tables(&dataset, metadata).await?;
        let changed = self.sync_table_visibility(database_id, &visible).await?;
        Ok(Some(changed))
    }

    pub(crate) async fn map_semantic_types(
        &self,
        database_id: DatabaseID,
        table_name: &str,
    ) -> Result<(), StepError> {
        let tables = self.bi_tool.list_tables(database_id).await?;
        let Some(table) = tables.into_iter().find(|t| t.name == table_name) else {
            return Ok(());
        };

        for field in table.fields {
            let Some(semantic_type) = semantic_type_for(&field.database_type) else {
                continue;
            };
            if field.semantic_type.as_deref() == Some(semantic_type) {
                continue;
            }

            self.bi_tool
                .set_field_semantic_type(field.id, semantic_type)
                .await?;
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub(crate) fn has_binding(bindings: &[ProjectBinding], role: &str, member: &str) -> bool {
    bindings
        .iter()
        .any(|b| b.role == role && b.members.iter().any(|m| m == member))
}

fn semantic_type_for(database_type: &str) -> Option<&'static str> {
    match database_type {
        "STRING" => Some(SEMANTIC_TYPE_NAME),
        "TIMESTAMP" => Some(SEMANTIC_TYPE_CREATION_TIMESTAMP),
        "DATE" => Some(SEMANTIC_TYPE_CREATION_DATE),
        _ => None,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
