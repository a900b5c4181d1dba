// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use tracing::info;

use crate::cli::Cli;
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Executes the `run` command to start the bridge.
pub async fn run(cli: &Cli) -> BinResult<()> {
    info!("Starting SLUICE Bridge...");

    let runtime = RuntimeBuilder::new().config_path(&cli.config).build()?;

    runtime.run().await
}
