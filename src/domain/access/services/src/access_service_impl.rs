// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;

use chrono::{DateTime, Utc};
use dill::*;
use internal_error::{InternalError, ResultIntoInternal};
use nada_access::*;
use nada_datasets::{
    Dataset,
    DatasetID,
    DatasetNotFoundError,
    DatasetRepository,
    GetDatasetError,
    JoinableViewRepository,
    PiiLevel,
};
use nada_integrations::{IntegrationMetadataRepository, IntegrationService, WorkflowKind};
use nada_platform_apis::{ApiResultExt, BiToolApi, BiToolApiExt, TableRef, WarehouseApi};
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Keeps warehouse grants, BI-tool group membership and the access ledger in
/// step. Downstream changes are applied before the ledger is written, so on a
/// partial failure the ledger lags and a retry converges.
pub struct AccessServiceImpl {
    dataset_repo: Arc<dyn DatasetRepository>,
    joinable_view_repo: Arc<dyn JoinableViewRepository>,
    access_repo: Arc<dyn AccessRepository>,
    access_request_repo: Arc<dyn AccessRequestRepository>,
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    integration_service: Arc<dyn IntegrationService>,
    warehouse: Arc<dyn WarehouseApi>,
    bi_tool: Arc<dyn BiToolApi>,
    time_source: Arc<dyn SystemTimeSource>,
}

#[component(pub)]
#[interface(dyn AccessService)]
#[scope(Singleton)]
impl AccessServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dataset_repo: Arc<dyn DatasetRepository>,
        joinable_view_repo: Arc<dyn JoinableViewRepository>,
        access_repo: Arc<dyn AccessRepository>,
        access_request_repo: Arc<dyn AccessRequestRepository>,
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        integration_service: Arc<dyn IntegrationService>,
        warehouse: Arc<dyn WarehouseApi>,
        bi_tool: Arc<dyn BiToolApi>,
        time_source: Arc<dyn SystemTimeSource>,
    ) -> Self {
        Self {
            dataset_repo,
            joinable_view_repo,
            access_repo,
            access_request_repo,
            metadata_repo,
            integration_service,
            warehouse,
            bi_tool,
            time_source,
        }
    }
}

impl AccessServiceImpl {
    async fn get_dataset<E>(&self, dataset_id: DatasetID) -> Result<Dataset, E>
    where
        E: From<DatasetNotFoundError> + From<InternalError>,
    {
        match self.dataset_repo.get_dataset(dataset_id).await {
            Ok(dataset) => Ok(dataset),
            Err(GetDatasetError::NotFound(e)) => Err(e.into()),
            Err(GetDatasetError::Internal(e)) => Err(e.into()),
        }
    }

    fn validate(
        &self,
        dataset: &Dataset,
        subject: &Subject,
        platform: Platform,
        expires: Option<DateTime<Utc>>,
    ) -> Result<(), AccessValidationError> {
        if subject.is_all_users() && dataset.pii == PiiLevel::Sensitive {
            return Err(AccessValidationError::new(format!(
                "dataset '{}' contains sensitive personal data and cannot be shared with all users",
                dataset.name
            )));
        }

        if platform == Platform::BiTool && !subject.is_user() && !subject.is_all_users() {
            return Err(AccessValidationError::new(format!(
                "BI-tool access can only be granted to users or to all users, got '{subject}'"
            )));
        }

        if let Some(expires) = expires {
            if expires <= self.time_source.now() {
                return Err(AccessValidationError::new(format!(
                    "expiry {expires} is in the past"
                )));
            }
        }

        Ok(())
    }

    /// Joinable views of the dataset owned by the subject
    async fn joinable_views(
        &self,
        dataset_id: DatasetID,
        subject: &Subject,
        active_only: bool,
    ) -> Result<Vec<TableRef>, InternalError> {
        let now = self.time_source.now();
        let joinable_views = self
            .joinable_view_repo
            .list_joinable_views_for_owner_and_dataset(&subject.email, dataset_id)
            .await?;

        Ok(joinable_views
            .iter()
            .filter(|jv| !active_only || jv.is_active(now))
            .flat_map(|jv| jv.views_of(dataset_id).cloned())
            .collect())
    }

    async fn grant_on_warehouse(
        &self,
        dataset: &Dataset,
        subject: &Subject,
    ) -> Result<(), InternalError> {
        let member = subject.warehouse_member();

        self.warehouse
            .grant(&dataset.datasource.table_ref(), &member)
            .await
            .int_err()?;

        for view in self.joinable_views(dataset.id, subject, true).await? {
            tracing::debug!(%view, "Granting read on joinable view");
            self.warehouse.grant(&view, &member).await.int_err()?;
        }

        Ok(())
    }

    async fn revoke_on_warehouse(
        &self,
        dataset: &Dataset,
        subject: &Subject,
    ) -> Result<(), InternalError> {
        let member = subject.warehouse_member();

        self.warehouse
            .revoke(&dataset.datasource.table_ref(), &member)
            .await
            .ignore_not_found()
            .int_err()?;

        for view in self.joinable_views(dataset.id, subject, false).await? {
            tracing::debug!(%view, "Revoking read on joinable view");
            self.warehouse
                .revoke(&view, &member)
                .await
                .ignore_not_found()
                .int_err()?;
        }

        Ok(())
    }

    /// Adds a user to the permission group of a restricted integration. An
    /// integration still being provisioned picks the user up when it
    /// finalizes.
    async fn add_group_member(
        &self,
        dataset_id: DatasetID,
        subject: &Subject,
    ) -> Result<(), InternalError> {
        let group_id = self
            .metadata_repo
            .find_metadata(dataset_id)
            .await?
            .filter(|m| m.deleted_at().is_none())
            .and_then(|m| m.permission_group_id());

        let Some(group_id) = group_id else {
            tracing::info!("No permission group to add the user to, recording access only");
            return Ok(());
        };

        let added = self
            .bi_tool
            .add_member_by_email(group_id, &subject.email)
            .await
            .int_err()?;
        tracing::info!(%group_id, added, "Ensured permission group membership");

        Ok(())
    }

    async fn remove_group_member(
        &self,
        dataset_id: DatasetID,
        subject: &Subject,
    ) -> Result<(), InternalError> {
        let group_id = self
            .metadata_repo
            .find_metadata(dataset_id)
            .await?
            .and_then(|m| m.permission_group_id());

        let Some(group_id) = group_id else {
            return Ok(());
        };

        let removed = self
            .bi_tool
            .remove_member_by_email(group_id, &subject.email)
            .await
            .ignore_not_found()
            .int_err()?;
        tracing::info!(%group_id, ?removed, "Removed permission group membership");

        Ok(())
    }

    async fn run_transition(
        &self,
        dataset_id: DatasetID,
        kinds: &[WorkflowKind],
    ) -> Result<(), TransitionError> {
        for kind in kinds {
            tracing::info!(%kind, "Running integration transition");

            let status = self
                .integration_service
                .run_workflow(dataset_id, *kind)
                .await
                .int_err()?;

            if status.has_failed || status.is_running {
                return Err(IntegrationTransitionFailedError {
                    dataset_id,
                    errors: status.errors(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Sharing a restricted integration with all users turns it into an open
    /// one. Unmapped datasets are left for the mapping worker.
    async fn open_for_all_users(&self, dataset_id: DatasetID) -> Result<(), TransitionError> {
        let metadata = self.metadata_repo.find_metadata(dataset_id).await?;
        if !metadata.is_some_and(|m| m.is_restricted()) {
            return Ok(());
        }

        self.run_transition(
            dataset_id,
            &[WorkflowKind::OpenRestricted, WorkflowKind::CreateOpen],
        )
        .await
    }

    async fn close_for_all_users(&self, dataset_id: DatasetID) -> Result<(), TransitionError> {
        let metadata = self.metadata_repo.find_metadata(dataset_id).await?;
        if !metadata.is_some_and(|m| m.is_open()) {
            return Ok(());
        }

        self.run_transition(dataset_id, &[WorkflowKind::DeleteOpen])
            .await
    }

    async fn grant(
        &self,
        grant: GrantAccess,
        access_request_id: Option<AccessRequestID>,
    ) -> Result<Access, GrantAccessError> {
        let dataset: Dataset = self.get_dataset::<GrantAccessError>(grant.dataset_id).await?;
        self.validate(&dataset, &grant.subject, grant.platform, grant.expires)?;

        match grant.platform {
            Platform::Warehouse => self.grant_on_warehouse(&dataset, &grant.subject).await?,
            Platform::BiTool if grant.subject.is_all_users() => {}
            Platform::BiTool => self.add_group_member(dataset.id, &grant.subject).await?,
        }

        let access = match self
            .access_repo
            .find_active_access(dataset.id, &grant.subject, grant.platform)
            .await?
        {
            Some(existing) => {
                tracing::info!(access_id = %existing.id, "Subject already holds this access");
                existing
            }
            None => {
                let access = Access {
                    id: AccessID::new_random(),
                    dataset_id: dataset.id,
                    owner: resolve_owner(&dataset, &grant.subject, grant.owner),
                    subject: grant.subject,
                    platform: grant.platform,
                    granter: grant.granter,
                    created: self.time_source.now(),
                    expires: grant.expires,
                    revoked: None,
                    access_request_id,
                };
                self.access_repo.create_access(&access).await?;
                tracing::info!(access_id = %access.id, "Access granted");
                access
            }
        };

        // Provisioning of the open database checks the ledger, so this runs
        // only after the access is recorded
        if access.platform == Platform::BiTool && access.subject.is_all_users() {
            self.open_for_all_users(dataset.id).await?;
        }

        Ok(access)
    }
}

#[async_trait::async_trait]
impl AccessService for AccessServiceImpl {
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(dataset_id = %request.dataset_id, subject = %request.subject, platform = %request.platform)
    )]
    async fn create_access_request(
        &self,
        request: NewAccessRequest,
    ) -> Result<AccessRequest, CreateAccessRequestError> {
        let dataset: Dataset = self.get_dataset::<CreateAccessRequestError>(request.dataset_id).await?;
        self.validate(&dataset, &request.subject, request.platform, request.expires)?;

        let access_request = AccessRequest {
            id: AccessRequestID::new_random(),
            dataset_id: dataset.id,
            subject: request.subject,
            owner: request.owner,
            platform: request.platform,
            polly_documentation: request.polly_documentation,
            expires: request.expires,
            status: AccessRequestStatus::Pending,
            created: self.time_source.now(),
            closed: None,
            granter: None,
            reason: None,
        };
        self.access_request_repo
            .create_access_request(&access_request)
            .await?;

        tracing::info!(request_id = %access_request.id, "Access requested");
        Ok(access_request)
    }

    #[tracing::instrument(level = "info", skip_all, fields(%request_id, %approver))]
    async fn approve_access_request(
        &self,
        request_id: AccessRequestID,
        approver: &str,
    ) -> Result<Access, ApproveAccessRequestError> {
        let mut request = self
            .access_request_repo
            .get_access_request(request_id)
            .await?;
        if !request.is_pending() {
            return Err(AccessRequestNotPendingError {
                request_id,
                status: request.status,
            }
            .into());
        }

        let access = self
            .grant(
                GrantAccess {
                    dataset_id: request.dataset_id,
                    subject: request.subject.clone(),
                    owner: request.owner.clone(),
                    platform: request.platform,
                    expires: request.expires,
                    granter: approver.to_string(),
                },
                Some(request_id),
            )
            .await?;

        request.status = AccessRequestStatus::Approved;
        request.closed = Some(self.time_source.now());
        request.granter = Some(approver.to_string());
        self.access_request_repo
            .update_access_request(&request)
            .await?;

        Ok(access)
    }

    #[tracing::instrument(level = "info", skip_all, fields(%request_id, %approver))]
    async fn deny_access_request(
        &self,
        request_id: AccessRequestID,
        approver: &str,
        reason: Option<String>,
    ) -> Result<AccessRequest, DenyAccessRequestError> {
        let mut request = self
            .access_request_repo
            .get_access_request(request_id)
            .await?;
        if !request.is_pending() {
            return Err(AccessRequestNotPendingError {
                request_id,
                status: request.status,
            }
            .into());
        }

        request.status = AccessRequestStatus::Denied;
        request.closed = Some(self.time_source.now());
        request.granter = Some(approver.to_string());
        request.reason = reason;
        self.access_request_repo
            .update_access_request(&request)
            .await?;

        tracing::info!("Access request denied");
        Ok(request)
    }

    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(dataset_id = %grant.dataset_id, subject = %grant.subject, platform = %grant.platform)
    )]
    async fn grant_access(&self, grant: GrantAccess) -> Result<Access, GrantAccessError> {
        self.grant(grant, None).await
    }

    #[tracing::instrument(level = "info", skip_all, fields(%access_id, %revoker))]
    async fn revoke_access(
        &self,
        access_id: AccessID,
        revoker: &str,
    ) -> Result<(), RevokeAccessError> {
        let access = self.access_repo.get_access(access_id).await?;
        if !access.is_active() {
            return Err(AccessAlreadyRevokedError { access_id }.into());
        }

        let dataset: Dataset = self.get_dataset::<RevokeAccessError>(access.dataset_id).await?;

        match access.platform {
            Platform::Warehouse => self.revoke_on_warehouse(&dataset, &access.subject).await?,
            Platform::BiTool if access.subject.is_all_users() => {
                self.close_for_all_users(dataset.id).await?;
            }
            Platform::BiTool => self.remove_group_member(dataset.id, &access.subject).await?,
        }

        self.access_repo
            .mark_access_revoked(access_id, self.time_source.now())
            .await?;

        tracing::info!(subject = %access.subject, platform = %access.platform, "Access revoked");
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Service accounts are accounted to the team owning the dataset unless the
/// grant names a group
fn resolve_owner(dataset: &Dataset, subject: &Subject, owner: Option<String>) -> String {
    match owner {
        Some(owner) => owner,
        None if subject.subject_type == SubjectType::ServiceAccount => dataset.owner_group.clone(),
        None => subject.email.clone(),
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, thiserror::Error)]
enum TransitionError {
    #[error(transparent)]
    Failed(#[from] IntegrationTransitionFailedError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<TransitionError> for GrantAccessError {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::Failed(e) => Self::Integration(e),
            TransitionError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<TransitionError> for RevokeAccessError {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::Failed(e) => Self::Integration(e),
            TransitionError::Internal(e) => Self::Internal(e),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
