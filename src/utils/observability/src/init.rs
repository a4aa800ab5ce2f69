// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use internal_error::{InternalError, ResultIntoInternal};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt as _;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output to STDERR
    Text,
    /// One JSON object per line to STDOUT, for log collectors
    Json,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Does nothing when a
/// subscriber is already installed (e.g. by test harnesses).
pub fn configure_logging(format: LogFormat, default_filter: &str) -> Result<(), InternalError> {
    if ::tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).int_err()?,
    };

    // Redirect all standard logging to tracing events
    tracing_log::LogTracer::init().int_err()?;

    match format {
        LogFormat::Text => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                    .with_writer(std::io::stderr),
            );
            ::tracing::subscriber::set_global_default(subscriber).int_err()?;
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::registry().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stdout),
            );
            ::tracing::subscriber::set_global_default(subscriber).int_err()?;
        }
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
