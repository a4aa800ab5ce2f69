// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::fmt;

use chrono::{DateTime, Utc};
use nada_datasets::DatasetID;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{IntegrationMetadata, Job, JobKind, JobState};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    CreateRestricted,
    CreateOpen,
    DeleteRestricted,
    DeleteOpen,
    /// Turns a restricted integration into an open one in place
    OpenRestricted,
}

impl WorkflowKind {
    pub fn steps(self) -> &'static [JobKind] {
        match self {
            Self::CreateRestricted => &[
                JobKind::PreflightCheck,
                JobKind::PermissionGroup,
                JobKind::Collection,
                JobKind::ServiceAccount,
                JobKind::ServiceAccountKey,
                JobKind::ProjectIam,
                JobKind::Database,
                JobKind::Verify,
                JobKind::Finalize,
            ],
            Self::CreateOpen => &[
                JobKind::PreflightCheck,
                JobKind::Database,
                JobKind::Verify,
                JobKind::Finalize,
            ],
            Self::DeleteRestricted => &[
                JobKind::RevokeWarehouseGrant,
                JobKind::DeleteDatabase,
                JobKind::ArchiveCollection,
                JobKind::RemoveProjectIam,
                JobKind::DeleteServiceAccount,
                JobKind::DeletePermissionGroup,
                JobKind::DeleteMetadata,
            ],
            Self::DeleteOpen => &[
                JobKind::RevokeSharedServiceAccountGrant,
                JobKind::DeleteDatabase,
                JobKind::DeleteMetadata,
            ],
            Self::OpenRestricted => &[
                JobKind::GrantSharedServiceAccount,
                JobKind::SwapDatabaseCredential,
                JobKind::DeleteRestrictedServiceAccount,
                JobKind::ResetToOpen,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateRestricted => "create_restricted",
            Self::CreateOpen => "create_open",
            Self::DeleteRestricted => "delete_restricted",
            Self::DeleteOpen => "delete_open",
            Self::OpenRestricted => "open_restricted",
        }
    }

    /// Whether the integration reached the end state this workflow drives to
    pub fn is_completed(self, metadata: Option<&IntegrationMetadata>) -> bool {
        match self {
            Self::CreateRestricted => {
                metadata.is_some_and(|m| m.is_restricted() && m.is_sync_completed())
            }
            Self::CreateOpen => metadata.is_some_and(|m| m.is_open() && m.is_sync_completed()),
            Self::DeleteRestricted | Self::DeleteOpen => metadata.is_none(),
            Self::OpenRestricted => metadata.is_some_and(IntegrationMetadata::is_open),
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowID(Uuid);

impl WorkflowID {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WorkflowID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One invocation of a workflow. Jobs are appended as steps are reached, so
/// the job list is a prefix of [`WorkflowKind::steps`]. The next job is
/// appended in the same transition that completes the previous one, which
/// keeps the workflow running until its last step ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowID,
    pub kind: WorkflowKind,
    pub dataset_id: DatasetID,
    /// 1-based counter of consecutive invocations after failures
    pub attempt: u32,
    pub first_attempt_at: DateTime<Utc>,
    pub jobs: Vec<Job>,
}

impl Workflow {
    /// `previous` is the last invocation of the same kind for the dataset, if
    /// any: a failed one makes this invocation a retry
    pub fn new(
        kind: WorkflowKind,
        dataset_id: DatasetID,
        now: DateTime<Utc>,
        previous: Option<&Workflow>,
    ) -> Self {
        let (attempt, first_attempt_at) = match previous {
            Some(previous) if previous.kind == kind && previous.has_failed() => {
                (previous.attempt + 1, previous.first_attempt_at)
            }
            _ => (1, now),
        };

        Self {
            id: WorkflowID::new_random(),
            kind,
            dataset_id,
            attempt,
            first_attempt_at,
            jobs: vec![Job::new(kind.steps()[0], now)],
        }
    }

    pub fn steps(&self) -> &'static [JobKind] {
        self.kind.steps()
    }

    pub fn is_running(&self) -> bool {
        self.jobs.iter().any(Job::is_active)
    }

    pub fn has_failed(&self) -> bool {
        self.jobs.iter().any(|j| j.state == JobState::Failed)
    }

    /// Every step completed in this invocation
    pub fn is_finished(&self) -> bool {
        self.jobs.len() == self.steps().len()
            && self.jobs.iter().all(|j| j.state == JobState::Completed)
    }

    pub fn errors(&self) -> Vec<String> {
        self.jobs
            .iter()
            .flat_map(|j| j.errors.iter().cloned())
            .collect()
    }

    pub fn current_job(&self) -> Option<&Job> {
        self.jobs.last()
    }

    pub fn current_job_mut(&mut self) -> Option<&mut Job> {
        self.jobs.last_mut()
    }

    /// Step following the current job, if the current job completed
    pub fn next_step(&self) -> Option<JobKind> {
        match self.current_job() {
            Some(job) if job.state == JobState::Completed => {
                self.steps().get(self.jobs.len()).copied()
            }
            _ => None,
        }
    }

    /// Fails the active job of an invocation that stopped before finishing.
    /// Returns `false` if the workflow was not running.
    pub fn interrupt(&mut self, now: DateTime<Utc>, error: impl Into<String>) -> bool {
        match self.current_job_mut() {
            Some(job) => job.interrupt(now, error.into()),
            None => false,
        }
    }

    /// Appends a pending job for the next step. Returns `false` when there is
    /// nothing left to run.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_step() {
            Some(kind) => {
                self.jobs.push(Job::new(kind, now));
                true
            }
            None => false,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// What callers poll: the job headers plus aggregated flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    pub workflow: Workflow,
    pub is_running: bool,
    pub has_failed: bool,
    pub is_completed: bool,
}

impl WorkflowStatus {
    pub fn new(workflow: Workflow, metadata: Option<&IntegrationMetadata>) -> Self {
        Self {
            is_running: workflow.is_running(),
            has_failed: workflow.has_failed(),
            is_completed: workflow.kind.is_completed(metadata),
            workflow,
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.workflow.errors()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
