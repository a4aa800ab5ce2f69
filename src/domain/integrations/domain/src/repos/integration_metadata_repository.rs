// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use internal_error::InternalError;
use nada_datasets::DatasetID;
use thiserror::Error;

use crate::IntegrationMetadata;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait IntegrationMetadataRepository: Send + Sync {
    async fn find_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<IntegrationMetadata>, InternalError>;

    async fn create_metadata(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<(), CreateIntegrationMetadataError>;

    async fn update_metadata(
        &self,
        metadata: &IntegrationMetadata,
    ) -> Result<(), UpdateIntegrationMetadataError>;

    async fn delete_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<(), DeleteIntegrationMetadataError>;

    async fn list_metadata(&self) -> Result<Vec<IntegrationMetadata>, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum CreateIntegrationMetadataError {
    #[error(transparent)]
    AlreadyExists(#[from] IntegrationMetadataAlreadyExistsError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum UpdateIntegrationMetadataError {
    #[error(transparent)]
    NotFound(#[from] IntegrationMetadataNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
pub enum DeleteIntegrationMetadataError {
    #[error(transparent)]
    NotFound(#[from] IntegrationMetadataNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
#[error("Integration metadata of dataset '{dataset_id}' already exists")]
pub struct IntegrationMetadataAlreadyExistsError {
    pub dataset_id: DatasetID,
}

#[derive(Debug, Error)]
#[error("Integration metadata of dataset '{dataset_id}' not found")]
pub struct IntegrationMetadataNotFoundError {
    pub dataset_id: DatasetID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
