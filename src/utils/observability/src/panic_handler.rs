// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::any::Any;
use std::backtrace::Backtrace;
use std::panic;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Reports panics through tracing, so that a background agent dying on
/// another thread still ends up in the structured log.
///
/// With `propagate` the previous hook (normally the stderr printer) runs
/// first.
pub fn set_hook_trace_panics(propagate: bool) {
    let previous_hook = propagate.then(panic::take_hook);

    panic::set_hook(Box::new(move |info| {
        if let Some(previous_hook) = &previous_hook {
            previous_hook(info);
        }

        let thread = std::thread::current();
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

        ::tracing::error!(
            error_msg = panic_message(info.payload()),
            thread = thread.name().unwrap_or("<unnamed>"),
            location = location.as_deref().unwrap_or("<unknown>"),
            error_backtrace = %Backtrace::force_capture(),
            "Unhandled panic caught"
        );
    }));
}

/// Extracts the message of `panic!("...")` and `panic!("{x}")` payloads
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Unknown panic payload"
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
