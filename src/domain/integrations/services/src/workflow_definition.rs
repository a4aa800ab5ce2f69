// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use nada_datasets::DatasetID;
use nada_integrations::{JobKind, StepError, WorkflowKind};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step changed state in the metadata store or a collaborator
    Performed,
    /// The checkpoint was already set, nothing was called
    AlreadyDone,
}

/// Fixed step list of one workflow kind and the logic of each step.
///
/// Every step must be idempotent: it reads the integration metadata first and
/// returns [`StepOutcome::AlreadyDone`] when its checkpoint is set.
#[async_trait::async_trait]
pub trait WorkflowDefinition: Send + Sync {
    fn workflow_kind(&self) -> WorkflowKind;

    async fn run_step(&self, step: JobKind, dataset_id: DatasetID)
    -> Result<StepOutcome, StepError>;
}

pub(crate) fn unsupported_step(kind: WorkflowKind, step: JobKind) -> StepError {
    StepError::Internal(internal_error::InternalError::new(format!(
        "Step '{step}' is not part of workflow '{kind}'"
    )))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
