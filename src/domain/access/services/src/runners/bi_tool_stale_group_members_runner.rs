// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::HashSet;
use std::sync::Arc;

use dill::*;
use internal_error::{InternalError, ResultIntoInternal};
use nada_access::{AccessRepository, Platform};
use nada_integrations::{IntegrationMetadata, IntegrationMetadataRepository};
use nada_platform_apis::{ApiResultExt, BiToolApi, PermissionGroupID};
use syncer::Runner;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Removes members of restricted permission groups that no longer hold active
/// BI-tool access to the dataset
pub struct BiToolStaleGroupMembersRunner {
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    access_repo: Arc<dyn AccessRepository>,
    bi_tool: Arc<dyn BiToolApi>,
}

#[component(pub)]
#[interface(dyn Runner)]
#[scope(Singleton)]
impl BiToolStaleGroupMembersRunner {
    pub fn new(
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        access_repo: Arc<dyn AccessRepository>,
        bi_tool: Arc<dyn BiToolApi>,
    ) -> Self {
        Self {
            metadata_repo,
            access_repo,
            bi_tool,
        }
    }

    async fn prune_group(
        &self,
        metadata: &IntegrationMetadata,
        group_id: PermissionGroupID,
    ) -> Result<usize, InternalError> {
        let allowed: HashSet<String> = self
            .access_repo
            .list_active_accesses(metadata.dataset_id())
            .await?
            .into_iter()
            .filter(|a| a.platform == Platform::BiTool && a.subject.is_user())
            .map(|a| a.subject.email.to_lowercase())
            .collect();

        let Some(members) = self
            .bi_tool
            .list_permission_group_members(group_id)
            .await
            .ignore_not_found()
            .int_err()?
        else {
            return Ok(0);
        };

        let mut removed = 0;
        for member in members {
            if allowed.contains(&member.email.to_lowercase()) {
                continue;
            }

            tracing::info!(
                dataset_id = %metadata.dataset_id(),
                %group_id,
                email = %member.email,
                "Removing stale permission group member"
            );
            self.bi_tool
                .remove_permission_group_member(member.membership_id)
                .await
                .ignore_not_found()
                .int_err()?;
            removed += 1;
        }

        Ok(removed)
    }
}

#[async_trait::async_trait]
impl Runner for BiToolStaleGroupMembersRunner {
    fn runner_name(&self) -> &'static str {
        "bi-tool-stale-group-members"
    }

    async fn run_once(&self) -> Result<(), InternalError> {
        let mut total_removed = 0;

        for metadata in self.metadata_repo.list_metadata().await? {
            // Groups of integrations still being provisioned are filled by
            // Finalize
            if !metadata.is_sync_completed() || metadata.deleted_at().is_some() {
                continue;
            }
            let Some(group_id) = metadata.permission_group_id() else {
                continue;
            };

            match self.prune_group(&metadata, group_id).await {
                Ok(removed) => total_removed += removed,
                Err(e) => {
                    tracing::error!(
                        dataset_id = %metadata.dataset_id(),
                        error = ?e,
                        error_msg = %e.reason(),
                        "Failed to prune permission group"
                    );
                }
            }
        }

        if total_removed > 0 {
            tracing::info!(total_removed, "Pruned stale permission group members");
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
