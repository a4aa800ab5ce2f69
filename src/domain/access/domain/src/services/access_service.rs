// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use chrono::{DateTime, Utc};
use internal_error::InternalError;
use nada_datasets::{DatasetID, DatasetNotFoundError};
use thiserror::Error;

use crate::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Keeps the access ledger and the downstream grants (warehouse IAM and BI-tool
/// group membership) consistent
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait AccessService: Send + Sync {
    async fn create_access_request(
        &self,
        request: NewAccessRequest,
    ) -> Result<AccessRequest, CreateAccessRequestError>;

    async fn approve_access_request(
        &self,
        request_id: AccessRequestID,
        approver: &str,
    ) -> Result<Access, ApproveAccessRequestError>;

    async fn deny_access_request(
        &self,
        request_id: AccessRequestID,
        approver: &str,
        reason: Option<String>,
    ) -> Result<AccessRequest, DenyAccessRequestError>;

    /// Grants access directly, without a request
    async fn grant_access(&self, grant: GrantAccess) -> Result<Access, GrantAccessError>;

    async fn revoke_access(
        &self,
        access_id: AccessID,
        revoker: &str,
    ) -> Result<(), RevokeAccessError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone)]
pub struct NewAccessRequest {
    pub dataset_id: DatasetID,
    pub subject: Subject,
    pub owner: Option<String>,
    pub platform: Platform,
    pub polly_documentation: Option<PollyDocumentation>,
    pub expires: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct GrantAccess {
    pub dataset_id: DatasetID,
    pub subject: Subject,
    /// Defaults to the subject, or to the dataset owner group for service
    /// accounts
    pub owner: Option<String>,
    pub platform: Platform,
    pub expires: Option<DateTime<Utc>>,
    pub granter: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Errors
////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum CreateAccessRequestError {
    #[error(transparent)]
    DatasetNotFound(#[from] DatasetNotFoundError),

    #[error(transparent)]
    Validation(#[from] AccessValidationError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum GrantAccessError {
    #[error(transparent)]
    DatasetNotFound(#[from] DatasetNotFoundError),

    #[error(transparent)]
    Validation(#[from] AccessValidationError),

    #[error(transparent)]
    Integration(#[from] IntegrationTransitionFailedError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum ApproveAccessRequestError {
    #[error(transparent)]
    NotFound(#[from] AccessRequestNotFoundError),

    #[error(transparent)]
    NotPending(#[from] AccessRequestNotPendingError),

    #[error(transparent)]
    Grant(#[from] GrantAccessError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum DenyAccessRequestError {
    #[error(transparent)]
    NotFound(#[from] AccessRequestNotFoundError),

    #[error(transparent)]
    NotPending(#[from] AccessRequestNotPendingError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum RevokeAccessError {
    #[error(transparent)]
    NotFound(#[from] AccessNotFoundError),

    #[error(transparent)]
    AlreadyRevoked(#[from] AccessAlreadyRevokedError),

    #[error(transparent)]
    DatasetNotFound(#[from] DatasetNotFoundError),

    #[error(transparent)]
    Integration(#[from] IntegrationTransitionFailedError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
#[error("Invalid access: {reason}")]
pub struct AccessValidationError {
    pub reason: String,
}

impl AccessValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("Access request '{request_id}' is already {status:?}")]
pub struct AccessRequestNotPendingError {
    pub request_id: AccessRequestID,
    pub status: AccessRequestStatus,
}

/// A BI-tool integration workflow triggered by the access change did not
/// complete. The ledger is left untouched.
#[derive(Debug, Error)]
#[error("Integration of dataset '{dataset_id}' failed to transition: {errors:?}")]
pub struct IntegrationTransitionFailedError {
    pub dataset_id: DatasetID,
    pub errors: Vec<String>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

impl From<GetAccessRequestError> for ApproveAccessRequestError {
    fn from(value: GetAccessRequestError) -> Self {
        match value {
            GetAccessRequestError::NotFound(e) => Self::NotFound(e),
            GetAccessRequestError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<GetAccessRequestError> for DenyAccessRequestError {
    fn from(value: GetAccessRequestError) -> Self {
        match value {
            GetAccessRequestError::NotFound(e) => Self::NotFound(e),
            GetAccessRequestError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<GetAccessError> for RevokeAccessError {
    fn from(value: GetAccessError) -> Self {
        match value {
            GetAccessError::NotFound(e) => Self::NotFound(e),
            GetAccessError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<MarkAccessRevokedError> for RevokeAccessError {
    fn from(value: MarkAccessRevokedError) -> Self {
        match value {
            MarkAccessRevokedError::NotFound(e) => Self::NotFound(e),
            MarkAccessRevokedError::AlreadyRevoked(e) => Self::AlreadyRevoked(e),
            MarkAccessRevokedError::Internal(e) => Self::Internal(e),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
