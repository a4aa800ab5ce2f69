// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;

use dill::*;
use internal_error::{InternalError, ResultIntoInternal};
use nada_integrations::*;
use nada_platform_apis::{ApiResultExt, CloudResourceManagerApi, service_account_member};
use syncer::Runner;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Removes project bindings of the dataset management role held by
/// per-dataset service accounts that no restricted integration owns anymore
pub struct IamPolicyDriftRunner {
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    resource_manager: Arc<dyn CloudResourceManagerApi>,
    config: Arc<IntegrationsConfig>,
}

#[component(pub)]
#[interface(dyn Runner)]
#[scope(Singleton)]
impl IamPolicyDriftRunner {
    pub fn new(
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        resource_manager: Arc<dyn CloudResourceManagerApi>,
        config: Arc<IntegrationsConfig>,
    ) -> Self {
        Self {
            metadata_repo,
            resource_manager,
            config,
        }
    }

    async fn is_owned(&self, member: &str) -> Result<bool, InternalError> {
        let Some(dataset_id) = restricted_service_account_dataset(member) else {
            // Not a per-dataset account
            return Ok(true);
        };

        let metadata = self.metadata_repo.find_metadata(dataset_id).await?;
        Ok(metadata.is_some_and(|m| {
            m.is_restricted()
                && m.service_account_email()
                    .is_some_and(|email| service_account_member(email) == member)
        }))
    }
}

#[async_trait::async_trait]
impl Runner for IamPolicyDriftRunner {
    fn runner_name(&self) -> &'static str {
        "iam-policy-drift"
    }

    async fn run_once(&self) -> Result<(), InternalError> {
        let project_id = &self.config.gcp_project;
        let role = &self.config.dataset_management_role;

        let bindings = self
            .resource_manager
            .list_project_bindings(project_id)
            .await
            .int_err()?;

        let members: Vec<_> = bindings
            .into_iter()
            .filter(|b| &b.role == role)
            .flat_map(|b| b.members)
            .collect();

        for member in members {
            if self.is_owned(&member).await? {
                continue;
            }

            tracing::info!(%member, %role, "Removing orphaned project binding");

            if let Err(e) = self
                .resource_manager
                .remove_project_binding(project_id, role, &member)
                .await
                .ignore_not_found()
            {
                tracing::error!(
                    %member,
                    error = ?e,
                    error_msg = %e,
                    "Failed to remove orphaned project binding"
                );
            }
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
