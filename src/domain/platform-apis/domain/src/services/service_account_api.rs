// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use crate::{ApiError, NewServiceAccount, ServiceAccount, ServiceAccountKey};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait ServiceAccountApi: Send + Sync {
    /// Returns the existing account if one with the same id exists
    async fn ensure_service_account(
        &self,
        request: &NewServiceAccount,
    ) -> Result<ServiceAccount, ApiError>;

    async fn delete_service_account(&self, email: &str) -> Result<(), ApiError>;

    async fn create_service_account_key(&self, email: &str) -> Result<ServiceAccountKey, ApiError>;

    async fn list_service_accounts(&self, project_id: &str)
    -> Result<Vec<ServiceAccount>, ApiError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
