// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


/// Creates a span that is detached from any current parent span, to be used
/// for units of work started by background loops.
///
/// ```ignore
/// observability::tracing::root_span!("Syncer::tick", runner = %name)
/// ```
#[macro_export]
macro_rules! root_span {
    ($name:expr) => {
        $crate::__tracing::info_span!(parent: None, $name)
    };
    ($name:expr, $($field:tt)*) => {
        $crate::__tracing::info_span!(parent: None, $name, $($field)*)
    };
}

pub use crate::root_span;
