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

use crate::{Dataset, DatasetID};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Read model of the catalogue's datasets
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait DatasetRepository: Send + Sync {
    async fn get_dataset(&self, dataset_id: DatasetID) -> Result<Dataset, GetDatasetError>;

    async fn list_datasets(&self) -> Result<Vec<Dataset>, InternalError>;

    async fn save_dataset(&self, dataset: &Dataset) -> Result<(), InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Error)]
pub enum GetDatasetError {
    #[error(transparent)]
    NotFound(#[from] DatasetNotFoundError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

#[derive(Debug, Error)]
#[error("Dataset '{dataset_id}' not found")]
pub struct DatasetNotFoundError {
    pub dataset_id: DatasetID,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
