// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use crate::{ApiError, ProjectBinding};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Project-level IAM bindings
#[cfg_attr(any(feature = "testing", test), mockall::automock)]
#[async_trait::async_trait]
pub trait CloudResourceManagerApi: Send + Sync {
    /// Union bind: adding an existing member is a no-op
    async fn add_project_binding(
        &self,
        project_id: &str,
        role: &str,
        member: &str,
    ) -> Result<(), ApiError>;

    async fn remove_project_binding(
        &self,
        project_id: &str,
        role: &str,
        member: &str,
    ) -> Result<(), ApiError>;

    async fn list_project_bindings(&self, project_id: &str)
    -> Result<Vec<ProjectBinding>, ApiError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
