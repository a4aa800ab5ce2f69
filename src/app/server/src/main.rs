// Copyright Kamu Data, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.


use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nada_server::config::{CONFIG_PATH_ENV_VAR, ServerConfig};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Parser)]
#[command(name = nada_server::BINARY_NAME, version = nada_server::VERSION)]
struct Cli {
    /// Path to the YAML config file
    #[arg(long, env = CONFIG_PATH_ENV_VAR)]
    config: Option<PathBuf>,

    /// Print the effective config and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ServerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    if cli.print_config {
        return match config.to_yaml() {
            Ok(yaml) => {
                print!("{yaml}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e:?}");
                ExitCode::FAILURE
            }
        };
    }

    let logging = config.logging();
    if let Err(e) = observability::init::configure_logging(logging.format(), logging.default_filter())
    {
        eprintln!("Error: {e:?}");
        return ExitCode::FAILURE;
    }

    observability::panic_handler::set_hook_trace_panics(true);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = ?e, error_msg = %e, "Failed to start the runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(nada_server::run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, error_msg = %e.reason(), "Server failed");
            ExitCode::FAILURE
        }
    }
}
