// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::time::Duration;

use async_utils::CancellationToken;
use nada_server::config::{LeaderElectionConfig, SyncerConfig, SyncersConfig};
use pretty_assertions::assert_eq;

use super::harness::ServerHarness;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_every_runner_gets_a_syncer() {
    let harness = ServerHarness::new();
    let catalog = nada_server::configure_catalog(&harness.config)
        .unwrap()
        .build();

    let syncers = nada_server::build_syncers(&catalog, &harness.config).unwrap();

    let mut names: Vec<_> = syncers.iter().map(|s| s.runner_name()).collect();
    names.sort_unstable();

    assert_eq!(
        names,
        [
            "access-expiry",
            "bi-tool-stale-group-members",
            "bi-tool-table-visibility",
            "iam-policy-drift",
            "mapping-queue-producer",
            "warehouse-missing-tables",
        ]
    );
}

#[test_log::test(tokio::test)]
async fn test_disabled_runners_are_skipped() {
    let mut harness = ServerHarness::new();
    harness.config.syncers = Some(SyncersConfig {
        iam_policy_drift: Some(SyncerConfig {
            enabled: Some(false),
            ..SyncerConfig::new()
        }),
        warehouse_missing_tables: Some(SyncerConfig {
            enabled: Some(false),
            ..SyncerConfig::new()
        }),
        ..SyncersConfig::default()
    });

    let catalog = nada_server::configure_catalog(&harness.config)
        .unwrap()
        .build();

    let syncers = nada_server::build_syncers(&catalog, &harness.config).unwrap();

    let names: Vec<_> = syncers.iter().map(|s| s.runner_name()).collect();
    assert_eq!(syncers.len(), 4);
    assert!(!names.contains(&"iam-policy-drift"));
    assert!(!names.contains(&"warehouse-missing-tables"));
}

#[test_log::test(tokio::test)]
async fn test_leader_check_without_elector() {
    let harness = ServerHarness::new();

    let leader_check = nada_server::build_leader_check(&harness.config).unwrap();

    assert!(leader_check.is_leader().await.unwrap());
}

#[test_log::test(tokio::test)]
async fn test_leader_check_rejects_invalid_elector() {
    let mut harness = ServerHarness::new();
    harness.config.leader_election = Some(LeaderElectionConfig {
        elector_path: Some("http://[::1".to_string()),
        hostname: Some("nada-0".to_string()),
    });

    assert!(nada_server::build_leader_check(&harness.config).is_err());
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test)]
async fn test_agents_stop_on_shutdown() {
    let harness = ServerHarness::new();
    let catalog = nada_server::configure_catalog(&harness.config)
        .unwrap()
        .build();

    let shutdown = CancellationToken::new();
    let agents = {
        let shutdown = shutdown.clone();
        let config = harness.config.clone();
        tokio::spawn(async move { nada_server::run_agents(&catalog, &config, shutdown).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!agents.is_finished());

    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(5), agents)
        .await
        .expect("agents did not stop")
        .unwrap()
        .unwrap();
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
