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

use crate::{Workflow, WorkflowID, WorkflowKind};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Keeps the latest invocation of every workflow kind per dataset
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait WorkflowRepository: Send + Sync {
    /// Registers a new invocation, atomically rejecting it while any workflow
    /// of the same dataset is still running
    async fn start_workflow(&self, workflow: &Workflow) -> Result<(), StartWorkflowError>;

    /// Persists a job transition of a started workflow
    async fn save_workflow(&self, workflow: &Workflow) -> Result<(), InternalError>;

    async fn get_latest_workflow(
        &self,
        dataset_id: DatasetID,
        kind: WorkflowKind,
    ) -> Result<Option<Workflow>, InternalError>;

    async fn find_running_workflow(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<Workflow>, InternalError>;

    /// Fails the active job of the workflow if it is still running, as one
    /// atomic update. Returns the updated workflow, or `None` when it had
    /// already finished.
    async fn interrupt_workflow(
        &self,
        workflow_id: WorkflowID,
        now: DateTime<Utc>,
        error: String,
    ) -> Result<Option<Workflow>, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum StartWorkflowError {
    #[error(transparent)]
    AlreadyRunning(#[from] WorkflowAlreadyRunningError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
#[error("Workflow '{running_kind}' of dataset '{dataset_id}' is still running")]
pub struct WorkflowAlreadyRunningError {
    pub dataset_id: DatasetID,
    pub running_kind: WorkflowKind,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
