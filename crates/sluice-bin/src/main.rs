// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! SLUICE - OPC UA to HTTP process-value bridge
//!
//! Main binary entry point.

use std::process::ExitCode;

use sluice_bin::cli::Cli;
use sluice_bin::commands;
use sluice_bin::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    logging::init_logging(cli.effective_log_level(), cli.log_format);

    match commands::dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
