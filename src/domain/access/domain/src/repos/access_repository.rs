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
use nada_datasets::DatasetID;
use thiserror::Error;

use crate::{Access, AccessID, Platform, Subject};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait AccessRepository: Send + Sync {
    async fn create_access(&self, access: &Access) -> Result<(), InternalError>;

    async fn get_access(&self, access_id: AccessID) -> Result<Access, GetAccessError>;

    async fn find_active_access(
        &self,
        dataset_id: DatasetID,
        subject: &Subject,
        platform: Platform,
    ) -> Result<Option<Access>, InternalError>;

    async fn list_active_accesses(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Vec<Access>, InternalError>;

    async fn list_all_active_accesses(&self) -> Result<Vec<Access>, InternalError>;

    async fn mark_access_revoked(
        &self,
        access_id: AccessID,
        revoked_at: DateTime<Utc>,
    ) -> Result<(), MarkAccessRevokedError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum GetAccessError {
    #[error(transparent)]
    NotFound(#[from] AccessNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum MarkAccessRevokedError {
    #[error(transparent)]
    NotFound(#[from] AccessNotFoundError),

    #[error(transparent)]
    AlreadyRevoked(#[from] AccessAlreadyRevokedError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
#[error("Access '{access_id}' not found")]
pub struct AccessNotFoundError {
    pub access_id: AccessID,
}

#[derive(Debug, Error)]
#[error("Access '{access_id}' is already revoked")]
pub struct AccessAlreadyRevokedError {
    pub access_id: AccessID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
