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
use internal_error::InternalError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobID(Uuid);

impl JobID {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Every step any workflow is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    // Provisioning
    PreflightCheck,
    PermissionGroup,
    Collection,
    ServiceAccount,
    ServiceAccountKey,
    ProjectIam,
    Database,
    Verify,
    Finalize,

    // Teardown
    RevokeWarehouseGrant,
    DeleteDatabase,
    ArchiveCollection,
    RemoveProjectIam,
    DeleteServiceAccount,
    DeletePermissionGroup,
    DeleteMetadata,
    RevokeSharedServiceAccountGrant,

    // Restricted to open
    GrantSharedServiceAccount,
    SwapDatabaseCredential,
    DeleteRestrictedServiceAccount,
    ResetToOpen,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreflightCheck => "preflight_check",
            Self::PermissionGroup => "permission_group",
            Self::Collection => "collection",
            Self::ServiceAccount => "service_account",
            Self::ServiceAccountKey => "service_account_key",
            Self::ProjectIam => "project_iam",
            Self::Database => "database",
            Self::Verify => "verify",
            Self::Finalize => "finalize",
            Self::RevokeWarehouseGrant => "revoke_warehouse_grant",
            Self::DeleteDatabase => "delete_database",
            Self::ArchiveCollection => "archive_collection",
            Self::RemoveProjectIam => "remove_project_iam",
            Self::DeleteServiceAccount => "delete_service_account",
            Self::DeletePermissionGroup => "delete_permission_group",
            Self::DeleteMetadata => "delete_metadata",
            Self::RevokeSharedServiceAccountGrant => "revoke_shared_service_account_grant",
            Self::GrantSharedServiceAccount => "grant_shared_service_account",
            Self::SwapDatabaseCredential => "swap_database_credential",
            Self::DeleteRestrictedServiceAccount => "delete_restricted_service_account",
            Self::ResetToOpen => "reset_to_open",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One execution of one workflow step: `Pending -> Running -> Completed | Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobID,
    pub kind: JobKind,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub state: JobState,
    /// The step found its checkpoint already set and made no downstream calls
    pub duplicate: bool,
    pub errors: Vec<String>,
}

impl Job {
    pub fn new(kind: JobKind, now: DateTime<Utc>) -> Self {
        Self {
            id: JobID::new_random(),
            kind,
            start_time: now,
            end_time: None,
            state: JobState::Pending,
            duplicate: false,
            errors: Vec::new(),
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), InternalError> {
        self.expect_state(JobState::Pending)?;
        self.start_time = now;
        self.state = JobState::Running;
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>, duplicate: bool) -> Result<(), InternalError> {
        self.expect_state(JobState::Running)?;
        self.end_time = Some(now);
        self.state = JobState::Completed;
        self.duplicate = duplicate;
        Ok(())
    }

    pub fn fail(&mut self, now: DateTime<Utc>, error: String) -> Result<(), InternalError> {
        self.expect_state(JobState::Running)?;
        self.finish_failed(now, error);
        Ok(())
    }

    /// Fails a job whose invocation went away before the step returned.
    /// Finished jobs are left untouched.
    pub fn interrupt(&mut self, now: DateTime<Utc>, error: String) -> bool {
        if !self.is_active() {
            return false;
        }
        self.finish_failed(now, error);
        true
    }

    fn finish_failed(&mut self, now: DateTime<Utc>, error: String) {
        self.end_time = Some(now);
        self.state = JobState::Failed;
        self.errors.push(error);
    }

    fn expect_state(&self, expected: JobState) -> Result<(), InternalError> {
        if self.state != expected {
            return InternalError::bail(format!(
                "Job {} of step '{}' is {:?}, expected {:?}",
                self.id, self.kind, self.state, expected
            ));
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, JobState::Pending | JobState::Running)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
