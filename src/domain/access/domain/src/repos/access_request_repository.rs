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

use crate::{AccessRequest, AccessRequestID};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait AccessRequestRepository: Send + Sync {
    async fn create_access_request(&self, request: &AccessRequest) -> Result<(), InternalError>;

    async fn get_access_request(
        &self,
        request_id: AccessRequestID,
    ) -> Result<AccessRequest, GetAccessRequestError>;

    async fn update_access_request(
        &self,
        request: &AccessRequest,
    ) -> Result<(), GetAccessRequestError>;

    async fn list_access_requests(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Vec<AccessRequest>, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum GetAccessRequestError {
    #[error(transparent)]
    NotFound(#[from] AccessRequestNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
#[error("Access request '{request_id}' not found")]
pub struct AccessRequestNotFoundError {
    pub request_id: AccessRequestID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
