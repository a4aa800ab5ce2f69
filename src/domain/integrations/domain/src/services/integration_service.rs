// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use internal_error::InternalError;
use nada_datasets::{DatasetID, DatasetNotFoundError, GetDatasetError};
use thiserror::Error;

use crate::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait IntegrationService: Send + Sync {
    /// Runs the workflow until its last step completes or a step fails.
    /// Step failures are reported through the returned status, not as errors.
    async fn run_workflow(
        &self,
        dataset_id: DatasetID,
        kind: WorkflowKind,
    ) -> Result<WorkflowStatus, RunWorkflowError>;

    async fn get_workflow_status(
        &self,
        dataset_id: DatasetID,
        kind: WorkflowKind,
    ) -> Result<Option<WorkflowStatus>, InternalError>;

    async fn find_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<IntegrationMetadata>, InternalError>;

    /// Records the desired services of a dataset and drives its integration
    /// towards them. Returns the status of every workflow that was run.
    async fn map_dataset(
        &self,
        dataset_id: DatasetID,
        services: Vec<ThirdPartyService>,
    ) -> Result<Vec<WorkflowStatus>, MapDatasetError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum RunWorkflowError {
    #[error(transparent)]
    AlreadyRunning(#[from] WorkflowAlreadyRunningError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<StartWorkflowError> for RunWorkflowError {
    fn from(value: StartWorkflowError) -> Self {
        match value {
            StartWorkflowError::AlreadyRunning(e) => Self::AlreadyRunning(e),
            StartWorkflowError::Internal(e) => Self::Internal(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum MapDatasetError {
    #[error(transparent)]
    DatasetNotFound(#[from] DatasetNotFoundError),

    #[error(transparent)]
    AlreadyRunning(#[from] WorkflowAlreadyRunningError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<RunWorkflowError> for MapDatasetError {
    fn from(value: RunWorkflowError) -> Self {
        match value {
            RunWorkflowError::AlreadyRunning(e) => Self::AlreadyRunning(e),
            RunWorkflowError::Internal(e) => Self::Internal(e),
        }
    }
}

impl From<GetDatasetError> for MapDatasetError {
    fn from(value: GetDatasetError) -> Self {
        match value {
            GetDatasetError::NotFound(e) => Self::DatasetNotFound(e),
            GetDatasetError::Internal(e) => Self::Internal(e),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
