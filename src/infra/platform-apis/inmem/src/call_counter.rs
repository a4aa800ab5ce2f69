// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::collections::HashMap;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Per-method counts of the mutating calls an emulator received
#[derive(Debug, Default)]
pub(crate) struct CallCounter {
    calls: HashMap<&'static str, usize>,
}

impl CallCounter {
    pub fn record(&mut self, method: &'static str) {
        *self.calls.entry(method).or_default() += 1;
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.get(method).copied().unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.calls.values().sum()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
