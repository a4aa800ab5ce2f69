// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use dill::*;
use internal_error::{ErrorIntoInternal, InternalError};
use nada_datasets::DatasetID;

use crate::domain::*;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Keeps the whole invocation history. The running check and the insert in
/// `start_workflow` happen under one lock, so concurrent starts for the same
/// dataset cannot both succeed.
pub struct InMemoryWorkflowRepository {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    workflows: Vec<Workflow>,
}

#[component(pub)]
#[interface(dyn WorkflowRepository)]
#[scope(Singleton)]
impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
        }
    }
}

#[async_trait::async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn start_workflow(&self, workflow: &Workflow) -> Result<(), StartWorkflowError> {
        let mut guard = self.state.lock().unwrap();

        if let Some(running) = guard
            .workflows
            .iter()
            .find(|wf| wf.dataset_id == workflow.dataset_id && wf.is_running())
        {
            return Err(WorkflowAlreadyRunningError {
                dataset_id: workflow.dataset_id,
                running_kind: running.kind,
            }
            .into());
        }

        if guard.workflows.iter().any(|wf| wf.id == workflow.id) {
            return Err(format!("Workflow '{}' already started", workflow.id)
                .int_err()
                .into());
        }

        guard.workflows.push(workflow.clone());
        Ok(())
    }

    async fn save_workflow(&self, workflow: &Workflow) -> Result<(), InternalError> {
        let mut guard = self.state.lock().unwrap();
        let Some(existing) = guard.workflows.iter_mut().find(|wf| wf.id == workflow.id) else {
            return InternalError::bail(format!("Workflow '{}' was never started", workflow.id));
        };

        *existing = workflow.clone();
        Ok(())
    }

    async fn get_latest_workflow(
        &self,
        dataset_id: DatasetID,
        kind: WorkflowKind,
    ) -> Result<Option<Workflow>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .workflows
            .iter()
            .rev()
            .find(|wf| wf.dataset_id == dataset_id && wf.kind == kind)
            .cloned())
    }

    async fn find_running_workflow(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<Workflow>, InternalError> {
        let guard = self.state.lock().unwrap();
        Ok(guard
            .workflows
            .iter()
            .find(|wf| wf.dataset_id == dataset_id && wf.is_running())
            .cloned())
    }

    async fn interrupt_workflow(
        &self,
        workflow_id: WorkflowID,
        now: DateTime<Utc>,
        error: String,
    ) -> Result<Option<Workflow>, InternalError> {
        let mut guard = self.state.lock().unwrap();
        let Some(workflow) = guard.workflows.iter_mut().find(|wf| wf.id == workflow_id) else {
            return InternalError::bail(format!("Workflow '{workflow_id}' was never started"));
        };

        if workflow.interrupt(now, error) {
            Ok(Some(workflow.clone()))
        } else {
            Ok(None)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
