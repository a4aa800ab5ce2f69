// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Abstracts the system time source
#[async_trait::async_trait]
pub trait SystemTimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[dill::component(pub)]
#[dill::interface(dyn SystemTimeSource)]
#[dill::scope(dill::Singleton)]
pub struct SystemTimeSourceDefault;

#[async_trait::async_trait]
impl SystemTimeSource for SystemTimeSourceDefault {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
struct AwaitingCaller {
    wake_up_time: DateTime<Utc>,
    waker_tx: Option<oneshot::Sender<()>>,
}

impl Eq for AwaitingCaller {}

impl PartialEq<Self> for AwaitingCaller {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for AwaitingCaller {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AwaitingCaller {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wake_up_time.cmp(&other.wake_up_time)
    }
}

#[derive(Debug)]
struct FakeSystemTimeSourceState {
    t: DateTime<Utc>,
    awaiting_callers: BinaryHeap<Reverse<AwaitingCaller>>,
}

/// Manually driven clock for tests: `sleep()` resolves only when the time is
/// advanced past the wake-up point
#[derive(Debug, Clone)]
pub struct FakeSystemTimeSource {
    state: Arc<Mutex<FakeSystemTimeSourceState>>,
}

impl FakeSystemTimeSource {
    pub fn new(t: DateTime<Utc>) -> Self {
        let state = FakeSystemTimeSourceState {
            t,
            awaiting_callers: BinaryHeap::new(),
        };

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn set(&self, t: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();

        assert!(
            state.t <= t,
            "The previous time [{}] is more than new time [{t}]",
            state.t
        );

        state.t = t;

        let mut ready_callers = vec![];

        while let Some(awaiting_caller) = state.awaiting_callers.peek() {
            if awaiting_caller.0.wake_up_time > t {
                break;
            }

            if let Some(ready_caller) = state.awaiting_callers.pop() {
                ready_callers.push(ready_caller);
            }
        }

        for mut ready_caller in ready_callers {
            if let Some(tx) = ready_caller.0.waker_tx.take() {
                // Sleeper might have been cancelled in the meantime
                let _ = tx.send(());
            }
        }
    }

    pub fn advance(&self, time_quantum: Duration) {
        let new_t = {
            let state = self.state.lock().unwrap();

            state.t + chrono::Duration::from_std(time_quantum).unwrap()
        };

        self.set(new_t);
    }

    pub fn num_awaiting_callers(&self) -> usize {
        self.state.lock().unwrap().awaiting_callers.len()
    }
}

#[async_trait::async_trait]
impl SystemTimeSource for FakeSystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        let state = self.state.lock().unwrap();

        state.t
    }

    async fn sleep(&self, duration: Duration) {
        let (tx, rx) = oneshot::channel();

        {
            let mut state = self.state.lock().unwrap();

            let wake_up_time = state.t + chrono::Duration::from_std(duration).unwrap();
            state.awaiting_callers.push(Reverse(AwaitingCaller {
                wake_up_time,
                waker_tx: Some(tx),
            }));
        }

        // Sender is only dropped after firing
        let _ = rx.await;
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
