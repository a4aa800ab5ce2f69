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
use nada_access::{AccessRepository, AccessService, RevokeAccessError};
use syncer::Runner;
use time_source::SystemTimeSource;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Recorded as the revoker of expired accesses
pub const ACCESS_EXPIRY_REVOKER: &str = "nada-access-expiry";

/// Revokes accesses whose expiry has passed
pub struct AccessExpiryRunner {
    access_repo: Arc<dyn AccessRepository>,
    access_service: Arc<dyn AccessService>,
    time_source: Arc<dyn SystemTimeSource>,
}

#[component(pub)]
#[interface(dyn Runner)]
#[scope(Singleton)]
impl AccessExpiryRunner {
    pub fn new(
        access_repo: Arc<dyn AccessRepository>,
        access_service: Arc<dyn AccessService>,
        time_source: Arc<dyn SystemTimeSource>,
    ) -> Self {
        Self {
            access_repo,
            access_service,
            time_source,
        }
    }
}

#[async_trait::async_trait]
impl Runner for AccessExpiryRunner {
    fn runner_name(&self) -> &'static str {
        "access-expiry"
    }

    async fn run_once(&self) -> Result<(), InternalError> {
        let now = self.time_source.now();

        let expired: Vec<_> = self
            .access_repo
            .list_all_active_accesses()
            .await?
            .into_iter()
            .filter(|a| a.is_expired(now))
            .collect();
        if expired.is_empty() {
            return Ok(());
        }

        tracing::info!(num_expired = expired.len(), "Revoking expired accesses");

        for access in expired {
            match self
                .access_service
                .revoke_access(access.id, ACCESS_EXPIRY_REVOKER)
                .await
            {
                // Revoked concurrently by someone else
                Ok(()) | Err(RevokeAccessError::AlreadyRevoked(_)) => {}
                Err(e) => {
                    tracing::error!(
                        access_id = %access.id,
                        dataset_id = %access.dataset_id,
                        error = ?e,
                        error_msg = %e,
                        "Failed to revoke expired access"
                    );
                }
            }
        }

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
