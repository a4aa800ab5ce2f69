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

use crate::ThirdPartyMapping;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait ThirdPartyMappingRepository: Send + Sync {
    /// Replaces the desired services of the dataset
    async fn set_mapping(&self, mapping: &ThirdPartyMapping) -> Result<(), InternalError>;

    async fn get_mapping(
        &self,
        dataset_id: DatasetID,
    ) -> Result<Option<ThirdPartyMapping>, InternalError>;

    async fn list_mappings(&self) -> Result<Vec<ThirdPartyMapping>, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
