// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_utils::{BackgroundAgent, CancellationToken};
use internal_error::InternalError;
use syncer::*;
use time_source::SystemTimeSourceDefault;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[test_log::test(tokio::test(start_paused = true))]
async fn test_keeps_ticking_when_runner_fails() {
    let calls = Arc::new(AtomicUsize::new(0));

    let mut runner = MockRunner::new();
    runner.expect_runner_name().return_const("failing");
    runner.expect_run_once().returning({
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            InternalError::bail("boom")
        }
    });

    let harness = SyncerHarness::new(
        runner,
        Arc::new(AlwaysLeader),
        SyncerOptions {
            run_at_start: true,
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
        },
    );

    tokio::time::sleep(Duration::from_millis(3500)).await;

    // Ticks at t=0 (start), 1, 2, 3
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    harness.shutdown().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_waits_full_interval_without_run_at_start() {
    let calls = Arc::new(AtomicUsize::new(0));

    let mut runner = MockRunner::new();
    runner.expect_runner_name().return_const("lazy");
    runner.expect_run_once().returning({
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let harness = SyncerHarness::new(
        runner,
        Arc::new(AlwaysLeader),
        SyncerOptions {
            run_at_start: false,
            initial_delay: Duration::from_secs(10),
            interval: Duration::from_secs(5),
        },
    );

    tokio::time::sleep(Duration::from_secs(14)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Initial delay of 10s followed by the first interval of 5s
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    harness.shutdown().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_skips_ticks_when_not_leader() {
    let mut runner = MockRunner::new();
    runner.expect_runner_name().return_const("leader-only");
    runner.expect_run_once().never();

    let mut leader_check = MockLeaderCheck::new();
    leader_check
        .expect_is_leader()
        .times(3)
        .returning(|| Ok(false));

    let harness = SyncerHarness::new(
        runner,
        Arc::new(leader_check),
        SyncerOptions {
            run_at_start: true,
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
        },
    );

    tokio::time::sleep(Duration::from_millis(2500)).await;

    harness.shutdown().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_skips_ticks_when_leader_check_fails() {
    let mut runner = MockRunner::new();
    runner.expect_runner_name().return_const("leader-only");
    runner.expect_run_once().times(1).returning(|| Ok(()));

    let mut leader_check = MockLeaderCheck::new();
    let mut seq = mockall::Sequence::new();
    leader_check
        .expect_is_leader()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| InternalError::bail("elector unreachable"));
    leader_check
        .expect_is_leader()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(true));

    let harness = SyncerHarness::new(
        runner,
        Arc::new(leader_check),
        SyncerOptions {
            run_at_start: true,
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
        },
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;

    harness.shutdown().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_stops_on_cancellation_during_initial_delay() {
    let mut runner = MockRunner::new();
    runner.expect_runner_name().return_const("never");
    runner.expect_run_once().never();

    let harness = SyncerHarness::new(
        runner,
        Arc::new(AlwaysLeader),
        SyncerOptions {
            run_at_start: true,
            initial_delay: Duration::from_secs(60),
            interval: Duration::from_secs(1),
        },
    );

    tokio::time::sleep(Duration::from_secs(1)).await;

    harness.shutdown().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_stops_on_cancellation_during_first_tick() {
    let runner = HangingRunner::default();
    let started = runner.started.clone();

    let harness = SyncerHarness::new(
        runner,
        Arc::new(AlwaysLeader),
        SyncerOptions {
            run_at_start: true,
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
        },
    );

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);

    harness.shutdown().await;
}

#[test_log::test(tokio::test(start_paused = true))]
async fn test_stops_on_cancellation_during_interval_tick() {
    let runner = HangingRunner::default();
    let started = runner.started.clone();

    let harness = SyncerHarness::new(
        runner,
        Arc::new(AlwaysLeader),
        SyncerOptions {
            run_at_start: false,
            initial_delay: Duration::ZERO,
            interval: Duration::from_secs(1),
        },
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);

    harness.shutdown().await;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

struct SyncerHarness {
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<Result<(), InternalError>>,
}

impl SyncerHarness {
    fn new(
        runner: impl Runner + 'static,
        leader_check: Arc<dyn LeaderCheck>,
        options: SyncerOptions,
    ) -> Self {
        let syncer = Arc::new(Syncer::new(
            Arc::new(runner),
            leader_check,
            Arc::new(SystemTimeSourceDefault),
            options,
        ));

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn({
            let shutdown = shutdown.clone();
            async move { syncer.run(shutdown).await }
        });

        Self { shutdown, handle }
    }

    async fn shutdown(self) {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("syncer did not stop")
            .unwrap()
            .unwrap();
    }
}

/// Runner whose runs never return
#[derive(Default)]
struct HangingRunner {
    started: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Runner for HangingRunner {
    fn runner_name(&self) -> &'static str {
        "hanging"
    }

    async fn run_once(&self) -> Result<(), InternalError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
