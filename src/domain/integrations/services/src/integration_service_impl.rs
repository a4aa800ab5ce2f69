// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use dill::*;
use internal_error::{InternalError, ResultIntoInternal};
use nada_access::{AccessRepository, Platform, Subject};
use nada_datasets::{DatasetID, DatasetRepository};
use nada_integrations::*;
use time_source::SystemTimeSource;

use crate::{StepOutcome, WorkflowDefinition};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub struct IntegrationServiceImpl {
    definitions: HashMap<WorkflowKind, Arc<dyn WorkflowDefinition>>,
    workflow_repo: Arc<dyn WorkflowRepository>,
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    mapping_repo: Arc<dyn ThirdPartyMappingRepository>,
    dataset_repo: Arc<dyn DatasetRepository>,
    access_repo: Arc<dyn AccessRepository>,
    time_source: Arc<dyn SystemTimeSource>,
    config: Arc<IntegrationsConfig>,
    live_workflows: Arc<Mutex<HashSet<WorkflowID>>>,
}

#[component(pub)]
#[interface(dyn IntegrationService)]
#[scope(Singleton)]
impl IntegrationServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        definitions: Vec<Arc<dyn WorkflowDefinition>>,
        workflow_repo: Arc<dyn WorkflowRepository>,
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        mapping_repo: Arc<dyn ThirdPartyMappingRepository>,
        dataset_repo: Arc<dyn DatasetRepository>,
        access_repo: Arc<dyn AccessRepository>,
        time_source: Arc<dyn SystemTimeSource>,
        config: Arc<IntegrationsConfig>,
    ) -> Self {
        let definitions = definitions.into_iter().fold(
            HashMap::new(),
            |mut acc: HashMap<WorkflowKind, Arc<dyn WorkflowDefinition>>, definition| {
                let kind = definition.workflow_kind();
                assert!(
                    !acc.contains_key(&kind),
                    "Workflow definition for '{kind}' already exists",
                );
                acc.insert(kind, definition);
                acc
            },
        );

        Self {
            definitions,
            workflow_repo,
            metadata_repo,
            mapping_repo,
            dataset_repo,
            access_repo,
            time_source,
            config,
            live_workflows: Arc::default(),
        }
    }

    fn get_definition(
        &self,
        kind: WorkflowKind,
    ) -> Result<Arc<dyn WorkflowDefinition>, InternalError> {
        self.definitions
            .get(&kind)
            .cloned()
            .ok_or_else(|| InternalError::new(format!("No workflow definition for '{kind}'")))
    }

    async fn run_jobs(
        &self,
        definition: &dyn WorkflowDefinition,
        workflow: &mut Workflow,
    ) -> Result<(), InternalError> {
        loop {
            let step = {
                let job = current_job(workflow)?;
                job.start(self.time_source.now())?;
                job.kind
            };
            self.workflow_repo.save_workflow(workflow).await?;

            tracing::debug!(%step, attempt = workflow.attempt, "Running workflow step");
            let result = definition.run_step(step, workflow.dataset_id).await;
            let now = self.time_source.now();

            match result {
                Ok(outcome) => {
                    current_job(workflow)?.complete(now, outcome == StepOutcome::AlreadyDone)?;
                    let has_next = workflow.advance(now);
                    self.workflow_repo.save_workflow(workflow).await?;

                    if !has_next {
                        tracing::info!("Workflow finished");
                        return Ok(());
                    }
                }
                Err(e) => {
                    self.log_step_failure(workflow, step, &e);

                    current_job(workflow)?.fail(now, e.job_error_message())?;
                    self.workflow_repo.save_workflow(workflow).await?;
                    return Ok(());
                }
            }
        }
    }

    /// A workflow left running by a lost process would block the dataset
    /// forever. Once its current step is older than
    /// `abandoned_workflow_after` and no run of this process owns it, it is
    /// failed before a new workflow starts.
    async fn release_abandoned_workflow(&self, dataset_id: DatasetID) -> Result<(), InternalError> {
        let Some(running) = self.workflow_repo.find_running_workflow(dataset_id).await? else {
            return Ok(());
        };

        if self.live_workflows.lock().unwrap().contains(&running.id) {
            return Ok(());
        }

        // Could still be owned by another process
        let now = self.time_source.now();
        let idle_since = running
            .current_job()
            .map_or(running.first_attempt_at, |job| job.start_time);
        let abandon_after = chrono::Duration::from_std(self.config.abandoned_workflow_after)
            .unwrap_or(chrono::Duration::MAX);
        if now - idle_since < abandon_after {
            return Ok(());
        }

        let interrupted = self
            .workflow_repo
            .interrupt_workflow(running.id, now, ABANDONED_STEP_ERROR.to_string())
            .await?;

        if let Some(workflow) = interrupted {
            tracing::warn!(
                workflow_id = %workflow.id,
                workflow_kind = %workflow.kind,
                attempt = workflow.attempt,
                "Released workflow abandoned mid-step"
            );
        }

        Ok(())
    }

    fn log_step_failure(&self, workflow: &Workflow, step: JobKind, e: &StepError) {
        match e {
            StepError::NotSynced { .. } => {
                let waiting = self.time_source.now() - workflow.first_attempt_at;
                let warn_after = chrono::Duration::from_std(self.config.verify_warn_after)
                    .unwrap_or(chrono::Duration::MAX);

                if waiting > warn_after {
                    tracing::warn!(
                        %step,
                        attempt = workflow.attempt,
                        waiting_secs = waiting.num_seconds(),
                        error_msg = %e,
                        "BI tool is still not done syncing the database",
                    );
                } else {
                    tracing::info!(
                        %step,
                        attempt = workflow.attempt,
                        error_msg = %e,
                        "Database not synced yet",
                    );
                }
            }
            _ if !e.is_retryable() => {
                tracing::warn!(%step, error = ?e, error_msg = %e, "Workflow step rejected");
            }
            _ => {
                tracing::error!(%step, error = ?e, error_msg = %e, "Workflow step failed");
            }
        }
    }

    /// Decides which workflows bring the integration of a dataset in line
    /// with the desired services
    async fn plan_workflows(
        &self,
        dataset_id: DatasetID,
        wants_bi_tool: bool,
    ) -> Result<Vec<WorkflowKind>, InternalError> {
        let metadata = self.metadata_repo.find_metadata(dataset_id).await?;

        if !wants_bi_tool {
            return Ok(match metadata {
                None => vec![],
                Some(m) if m.is_open() => vec![WorkflowKind::DeleteOpen],
                Some(_) => vec![WorkflowKind::DeleteRestricted],
            });
        }

        let shared_with_all_users = self
            .access_repo
            .find_active_access(dataset_id, &Subject::all_users(), Platform::BiTool)
            .await?
            .is_some();

        // A deletion that stopped halfway is finished before provisioning anew
        if let Some(m) = metadata.as_ref().filter(|m| m.deleted_at().is_some()) {
            let delete = if m.is_open() {
                WorkflowKind::DeleteOpen
            } else {
                WorkflowKind::DeleteRestricted
            };
            let create = if shared_with_all_users {
                WorkflowKind::CreateOpen
            } else {
                WorkflowKind::CreateRestricted
            };
            return Ok(vec![delete, create]);
        }

        Ok(match metadata {
            None if shared_with_all_users => vec![WorkflowKind::CreateOpen],
            None => vec![WorkflowKind::CreateRestricted],
            Some(m) if m.is_open() => vec![WorkflowKind::CreateOpen],
            Some(_) if shared_with_all_users => {
                vec![WorkflowKind::OpenRestricted, WorkflowKind::CreateOpen]
            }
            Some(_) => vec![WorkflowKind::CreateRestricted],
        })
    }
}

#[async_trait::async_trait]
impl IntegrationService for IntegrationServiceImpl {
    #[tracing::instrument(level = "info", skip_all, fields(%dataset_id, %kind))]
    async fn run_workflow(
        &self,
        dataset_id: DatasetID,
        kind: WorkflowKind,
    ) -> Result<WorkflowStatus, RunWorkflowError> {
        let definition = self.get_definition(kind)?;

        self.release_abandoned_workflow(dataset_id).await?;

        let previous = self
            .workflow_repo
            .get_latest_workflow(dataset_id, kind)
            .await?;
        let mut workflow = Workflow::new(
            kind,
            dataset_id,
            self.time_source.now(),
            previous.as_ref(),
        );

        let mut guard = LiveWorkflowGuard::new(
            workflow.id,
            self.live_workflows.clone(),
            self.workflow_repo.clone(),
            self.time_source.clone(),
        );

        self.workflow_repo.start_workflow(&workflow).await?;
        tracing::info!(workflow_id = %workflow.id, attempt = workflow.attempt, "Workflow started");

        guard.armed = true;
        self.run_jobs(definition.as_ref(), &mut workflow).await?;
        guard.armed = false;

        let metadata = self.metadata_repo.find_metadata(dataset_id).await?;
        Ok(WorkflowStatus::new(workflow, metadata.as_ref()))
    }

    async fn get_workflow_status(
        &self,
        dataset_id: DatasetID,
        kind: WorkflowKind,
    ) -> Result<Option<WorkflowStatus>, InternalError> {
        let Some(workflow) = self
            .workflow_repo
            .get_latest_workflow(dataset_id, kind)
            .await?
        else {
            return Ok(None);
        };

        let metadata = self.metadata_repo.find_metadata(dataset_id).await?;
        Ok(Some(WorkflowStatus::new(workflow, metadata.as_ref())))
    }

    async fn find_metadata(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<IntegrationMetadata>, InternalError> {
        self.metadata_repo.find_metadata(dataset_id).await
    }

    #[tracing::instrument(level = "info", skip_all, fields(%dataset_id, ?services))]
    async fn map_dataset(
        &self,
        dataset_id: DatasetID,
        services: Vec<ThirdPartyService>,
    ) -> Result<Vec<WorkflowStatus>, MapDatasetError> {
        self.dataset_repo.get_dataset(dataset_id).await?;

        let mapping = ThirdPartyMapping {
            dataset_id,
            services,
        };
        self.mapping_repo.set_mapping(&mapping).await?;

        let plan = self
            .plan_workflows(dataset_id, mapping.wants_bi_tool())
            .await?;
        tracing::debug!(?plan, "Planned integration workflows");

        let mut statuses = Vec::with_capacity(plan.len());
        for kind in plan {
            let status = self.run_workflow(dataset_id, kind).await?;
            let failed = status.has_failed;
            statuses.push(status);

            if failed {
                break;
            }
        }

        Ok(statuses)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

const ABANDONED_STEP_ERROR: &str = "Step was interrupted before it finished";

/// Marks a workflow as executed by this process. When dropped while still
/// armed, the run was cancelled or failed mid-step and the workflow is failed
/// in the background.
struct LiveWorkflowGuard {
    workflow_id: WorkflowID,
    live_workflows: Arc<Mutex<HashSet<WorkflowID>>>,
    workflow_repo: Arc<dyn WorkflowRepository>,
    time_source: Arc<dyn SystemTimeSource>,
    armed: bool,
}

impl LiveWorkflowGuard {
    fn new(
        workflow_id: WorkflowID,
        live_workflows: Arc<Mutex<HashSet<WorkflowID>>>,
        workflow_repo: Arc<dyn WorkflowRepository>,
        time_source: Arc<dyn SystemTimeSource>,
    ) -> Self {
        live_workflows.lock().unwrap().insert(workflow_id);

        Self {
            workflow_id,
            live_workflows,
            workflow_repo,
            time_source,
            armed: false,
        }
    }
}

impl Drop for LiveWorkflowGuard {
    fn drop(&mut self) {
        self.live_workflows.lock().unwrap().remove(&self.workflow_id);

        if !self.armed {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                workflow_id = %self.workflow_id,
                "Workflow run dropped outside of a runtime, it will be released on the next run"
            );
            return;
        };

        let workflow_id = self.workflow_id;
        let workflow_repo = self.workflow_repo.clone();
        let now = self.time_source.now();

        handle.spawn(async move {
            match workflow_repo
                .interrupt_workflow(workflow_id, now, ABANDONED_STEP_ERROR.to_string())
                .await
            {
                Ok(Some(_)) => {
                    tracing::warn!(%workflow_id, "Failed workflow whose run was cancelled mid-step");
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        %workflow_id,
                        error = ?e,
                        error_msg = %e,
                        "Failed to release cancelled workflow"
                    );
                }
            }
        });
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn current_job(workflow: &mut Workflow) -> Result<&mut Job, InternalError> {
    let workflow_id = workflow.id;
    workflow
        .current_job_mut()
        .ok_or_else(|| format!("Workflow {workflow_id} has no jobs"))
        .int_err()
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
