// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use internal_error::InternalError;

use crate::{DatasetID, JoinableView};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait JoinableViewRepository: Send + Sync {
    async fn save_joinable_view(&self, joinable_view: &JoinableView) -> Result<(), InternalError>;

    /// Non-deleted joinable views owned by the subject that include a view
    /// of the dataset
    async fn list_joinable_views_for_owner_and_dataset(
        &self,
        owner: &str,
        dataset_id: DatasetID,
    ) -> Result<Vec<JoinableView>, InternalError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
