// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use serde::Serialize;

use sluice_config::load_config;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Machine-readable validation report.
#[derive(Debug, Serialize)]
struct ValidationReport {
    valid: bool,
    config_file: String,
    tags: usize,
    endpoint: String,
}

/// Executes the `validate` command.
///
/// Loads and validates the configuration without starting the bridge. The
/// process exits non-zero if validation fails, so this is usable in CI and
/// deployment pipelines.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = load_config(&cli.config).map_err(|e| BinError::Configuration(e.to_string()))?;

    let report = ValidationReport {
        valid: true,
        config_file: cli.config.display().to_string(),
        tags: config.tags.len(),
        endpoint: config.source.endpoint.clone(),
    };

    match args.format {
        OutputFormat::Text => {
            println!("Configuration OK: {}", report.config_file);
            println!("  source endpoint: {}", report.endpoint);
            println!("  tags: {}", report.tags);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| BinError::Runtime(e.to_string()))?;
            println!("{}", json);
        }
    }

    if args.show_config {
        let rendered =
            serde_yaml::to_string(&config).map_err(|e| BinError::Runtime(e.to_string()))?;
        println!();
        println!("{}", rendered);
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
