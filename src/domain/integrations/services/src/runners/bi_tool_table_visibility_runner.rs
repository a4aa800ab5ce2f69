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
use internal_error::InternalError;
use nada_integrations::*;
use syncer::Runner;

use crate::IntegrationSteps;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Re-applies table visibility of every completed integration, picking up
/// tables created in the warehouse after provisioning
pub struct BiToolTableVisibilityRunner {
    metadata_repo: Arc<dyn IntegrationMetadataRepository>,
    steps: Arc<IntegrationSteps>,
}

#[component(pub)]
#[interface(dyn Runner)]
#[scope(Singleton)]
impl BiToolTableVisibilityRunner {
    pub fn new(
        metadata_repo: Arc<dyn IntegrationMetadataRepository>,
        steps: Arc<IntegrationSteps>,
    ) -> Self {
        Self {
            metadata_repo,
            steps,
        }
    }
}

#[async_trait::async_trait]
impl Runner for BiToolTableVisibilityRunner {
    fn runner_name(&self) -> &'static str {
        "bi-tool-table-visibility"
    }

    async fn run_once(&self) -> Result<(), InternalError> {
        for metadata in self.metadata_repo.list_metadata().await? {
            let dataset_id = metadata.dataset_id();

            match self.steps.resync_table_visibility(&metadata).await {
                Ok(Some(changed)) if changed > 0 => {
                    tracing::info!(%dataset_id, changed, "Updated BI-tool table visibility");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(
                    %dataset_id,
                    error = ?e,
                    error_msg = %e,
                    "Failed to sync BI-tool table visibility"
                ),
            }
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
