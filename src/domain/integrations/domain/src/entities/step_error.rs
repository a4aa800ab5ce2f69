// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use internal_error::InternalError;
use nada_platform_apis::{ApiError, DatabaseID};
use thiserror::Error;

use crate::IntegrationShapeError;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Failure of a single workflow step. The rendered message is recorded on
/// the job.
#[derive(Debug, Error)]
pub enum StepError {
    /// Preconditions violated, re-running will not help
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error(transparent)]
    Shape(#[from] IntegrationShapeError),

    /// A record the step depends on does not exist
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// The BI tool has not finished syncing the table yet
    #[error("Database {database_id} is not synced yet: {reason}")]
    NotSynced {
        database_id: DatabaseID,
        reason: String,
    },

    #[error("Collaborator call failed: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl StepError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Validation failures are never retried, everything else is retried by
    /// invoking the workflow again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation { .. } | Self::Shape(_))
    }

    /// Message stored on the failed job, including the internal cause chain
    pub fn job_error_message(&self) -> String {
        match self {
            Self::Internal(e) | Self::Api(ApiError::Internal(e)) => e.reason(),
            _ => self.to_string(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
