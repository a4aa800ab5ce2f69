// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;
use std::time::Duration;

use async_utils::{BackgroundAgent, CancellationToken};
use internal_error::InternalError;
use time_source::SystemTimeSource;
use tracing::Instrument as _;

use crate::{LeaderCheck, Runner};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncerOptions {
    /// Run once immediately after the initial delay instead of waiting a
    /// full interval
    pub run_at_start: bool,
    pub initial_delay: Duration,
    pub interval: Duration,
}

impl Default for SyncerOptions {
    fn default() -> Self {
        Self {
            run_at_start: false,
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(60 * 60),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Drives a [`Runner`] on a fixed interval.
///
/// Ticks never overlap: the next interval starts only after `run_once`
/// returns. Shutdown interrupts both the wait and a running tick. Errors of the runner and of the leader check are logged and
/// swallowed, so a failing runner keeps being retried on the following ticks.
pub struct Syncer {
    runner: Arc<dyn Runner>,
    leader_check: Arc<dyn LeaderCheck>,
    time_source: Arc<dyn SystemTimeSource>,
    options: SyncerOptions,
}

impl Syncer {
    pub fn new(
        runner: Arc<dyn Runner>,
        leader_check: Arc<dyn LeaderCheck>,
        time_source: Arc<dyn SystemTimeSource>,
        options: SyncerOptions,
    ) -> Self {
        Self {
            runner,
            leader_check,
            time_source,
            options,
        }
    }

    pub fn runner_name(&self) -> &'static str {
        self.runner.runner_name()
    }

    async fn tick(&self) {
        let runner_name = self.runner.runner_name();

        match self.leader_check.is_leader().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(runner_name, "Not the leader, skipping tick");
                return;
            }
            Err(e) => {
                tracing::error!(
                    runner_name,
                    error = ?e,
                    error_msg = %e.reason(),
                    "Leader check failed, skipping tick"
                );
                return;
            }
        }

        let span = observability::tracing::root_span!("Syncer::tick", runner_name);

        async {
            tracing::debug!("Running");

            match self.runner.run_once().await {
                Ok(()) => tracing::debug!("Run completed"),
                Err(e) => tracing::error!(
                    error = ?e,
                    error_msg = %e.reason(),
                    "Run failed"
                ),
            }
        }
        .instrument(span)
        .await;
    }

    /// Returns `false` if cancelled before the tick ended. The runner is
    /// dropped mid-run in that case.
    async fn tick_until(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            () = shutdown.cancelled() => {
                tracing::info!(
                    runner_name = self.runner.runner_name(),
                    "Shutdown requested, abandoning the running tick"
                );
                false
            }
            () = self.tick() => true,
        }
    }

    /// Returns `false` if cancelled while sleeping
    async fn sleep(&self, duration: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            () = shutdown.cancelled() => false,
            () = self.time_source.sleep(duration) => true,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait::async_trait]
impl BackgroundAgent for Syncer {
    fn agent_name(&self) -> &'static str {
        self.runner.runner_name()
    }

    async fn run(&self, shutdown: CancellationToken) -> Result<(), InternalError> {
        let runner_name = self.runner.runner_name();

        tracing::info!(
            runner_name,
            options = ?self.options,
            "Starting syncer"
        );

        if !self.options.initial_delay.is_zero()
            && !self.sleep(self.options.initial_delay, &shutdown).await
        {
            return Ok(());
        }

        let mut running = !self.options.run_at_start || self.tick_until(&shutdown).await;

        while running && self.sleep(self.options.interval, &shutdown).await {
            running = self.tick_until(&shutdown).await;
        }

        tracing::info!(runner_name, "Syncer stopped");

        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
