// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use crate::{ApiError, TablePolicy, TableRef, WarehouseTable};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait WarehouseApi: Send + Sync {
    /// Grants read access on a table or view. Granting an existing member is
    /// a no-op.
    async fn grant(&self, table: &TableRef, member: &str) -> Result<(), ApiError>;

    /// Revokes read access. Revoking an absent member is a no-op.
    async fn revoke(&self, table: &TableRef, member: &str) -> Result<(), ApiError>;

    async fn get_table(&self, table: &TableRef) -> Result<WarehouseTable, ApiError>;

    async fn list_tables(
        &self,
        project_id: &str,
        dataset: &str,
    ) -> Result<Vec<WarehouseTable>, ApiError>;

    async fn get_table_policy(&self, table: &TableRef) -> Result<TablePolicy, ApiError>;

    /// Replaces the whole policy of a table
    async fn update_table_policy(
        &self,
        table: &TableRef,
        policy: TablePolicy,
    ) -> Result<(), ApiError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
