// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;

use async_utils::{BackgroundAgent, CancellationToken};
use dill::{Catalog, CatalogBuilder};
use internal_error::{InternalError, ResultIntoInternal};
use syncer::{AlwaysLeader, HttpLeaderElection, LeaderCheck, Runner, Syncer};
use time_source::{SystemTimeSource, SystemTimeSourceDefault};
use tracing::Instrument as _;

use crate::config::ServerConfig;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub const BINARY_NAME: &str = "nada-server";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn run(config: ServerConfig) -> Result<(), InternalError> {
    tracing::info!(
        version = VERSION,
        config = ?config,
        "Starting {BINARY_NAME}"
    );

    let catalog = configure_catalog(&config)?.build();

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received shutdown signal"),
                Err(e) => tracing::error!(
                    error = ?e,
                    error_msg = %e,
                    "Failed to listen for shutdown signal"
                ),
            }
            shutdown.cancel();
        });
    }

    run_agents(&catalog, &config, shutdown).await
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Registers configs, repositories, platform emulators and all domain
/// services
pub fn configure_catalog(config: &ServerConfig) -> Result<CatalogBuilder, InternalError> {
    let mut b = CatalogBuilder::new();

    b.add::<SystemTimeSourceDefault>();

    b.add_value(
        config
            .integrations
            .clone()
            .unwrap_or_default()
            .to_domain()?,
    );
    b.add_value(
        config
            .mapping_queue
            .clone()
            .unwrap_or_default()
            .to_domain(),
    );

    configure_in_memory_components(&mut b);

    nada_integrations_services::register_dependencies(&mut b);
    nada_access_services::register_dependencies(&mut b);

    Ok(b)
}

pub fn configure_in_memory_components(b: &mut CatalogBuilder) {
    b.add::<nada_datasets_inmem::InMemoryDatasetRepository>();
    b.add::<nada_datasets_inmem::InMemoryJoinableViewRepository>();
    b.add::<nada_access_inmem::InMemoryAccessRepository>();
    b.add::<nada_access_inmem::InMemoryAccessRequestRepository>();
    b.add::<nada_integrations_inmem::InMemoryIntegrationMetadataRepository>();
    b.add::<nada_integrations_inmem::InMemoryThirdPartyMappingRepository>();
    b.add::<nada_integrations_inmem::InMemoryWorkflowRepository>();

    b.add::<nada_platform_apis_inmem::InMemoryWarehouse>();
    b.add::<nada_platform_apis_inmem::InMemoryBiTool>();
    b.add::<nada_platform_apis_inmem::InMemoryServiceAccounts>();
    b.add::<nada_platform_apis_inmem::InMemoryCloudResourceManager>();
    b.add::<nada_platform_apis_inmem::InMemoryKms>();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub fn build_leader_check(config: &ServerConfig) -> Result<Arc<dyn LeaderCheck>, InternalError> {
    let leader_election = config.leader_election.clone().unwrap_or_default();

    let Some(elector_path) = leader_election.elector_path else {
        tracing::info!("Leader election is not configured, this replica is always the leader");
        return Ok(Arc::new(AlwaysLeader));
    };

    let hostname = match leader_election.hostname {
        Some(hostname) => hostname,
        None => whoami::fallible::hostname().int_err()?,
    };

    tracing::info!(%elector_path, %hostname, "Using leader election sidecar");

    Ok(Arc::new(HttpLeaderElection::new(
        Some(&elector_path),
        hostname,
    )?))
}

/// Wraps every enabled runner into its own [`Syncer`]
pub fn build_syncers(catalog: &Catalog, config: &ServerConfig) -> Result<Vec<Syncer>, InternalError> {
    let runners = catalog.get::<dill::AllOf<dyn Runner>>().int_err()?;
    let time_source = catalog.get_one::<dyn SystemTimeSource>().int_err()?;
    let leader_check = build_leader_check(config)?;
    let always_leader: Arc<dyn LeaderCheck> = Arc::new(AlwaysLeader);

    let mut syncers = Vec::new();

    for runner in runners {
        let syncer_config = config.syncer(runner.runner_name());

        if !syncer_config.is_enabled() {
            tracing::info!(runner_name = runner.runner_name(), "Syncer is disabled");
            continue;
        }

        let leader_check = if syncer_config.is_leader_only() {
            leader_check.clone()
        } else {
            always_leader.clone()
        };

        syncers.push(Syncer::new(
            runner,
            leader_check,
            time_source.clone(),
            syncer_config.to_options(),
        ));
    }

    Ok(syncers)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Runs all background agents until the token is cancelled and every agent
/// has returned
pub async fn run_agents(
    catalog: &Catalog,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<(), InternalError> {
    let mut agents = catalog.get::<dill::AllOf<dyn BackgroundAgent>>().int_err()?;

    agents.extend(
        build_syncers(catalog, config)?
            .into_iter()
            .map(|syncer| Arc::new(syncer) as Arc<dyn BackgroundAgent>),
    );

    let mut join_set = tokio::task::JoinSet::new();

    for agent in agents {
        let agent_name = agent.agent_name();
        let shutdown = shutdown.clone();
        let span = observability::tracing::root_span!("BackgroundAgent", agent_name);

        tracing::debug!(agent_name, "Spawning background agent");

        join_set.spawn(
            async move { (agent_name, agent.run(shutdown).await) }.instrument(span),
        );
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((agent_name, Ok(()))) => tracing::info!(agent_name, "Background agent stopped"),
            Ok((agent_name, Err(e))) => tracing::error!(
                agent_name,
                error = ?e,
                error_msg = %e.reason(),
                "Background agent failed"
            ),
            Err(e) => tracing::error!(
                error = ?e,
                error_msg = %e,
                "Background agent panicked"
            ),
        }
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
