// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use internal_error::InternalError;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Error returned by every collaborator call
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    NotFound(#[from] ResourceNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl ApiError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound(ResourceNotFoundError {
            resource,
            id: id.to_string(),
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
#[error("{resource} '{id}' not found")]
pub struct ResourceNotFoundError {
    pub resource: &'static str,
    pub id: String,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub trait ApiResultExt<T> {
    /// Turns "already absent" into `Ok(None)`, for teardown paths
    fn ignore_not_found(self) -> Result<Option<T>, ApiError>;
}

impl<T> ApiResultExt<T> for Result<T, ApiError> {
    fn ignore_not_found(self) -> Result<Option<T>, ApiError> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
