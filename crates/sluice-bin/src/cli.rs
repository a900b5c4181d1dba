// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! Subcommands:
//!
//! - `run`: start the bridge (default)
//! - `validate`: validate the configuration file without starting
//! - `version`: show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// SLUICE - OPC UA to HTTP process-value bridge
///
/// Polls a configured set of tags from an OPC UA server and serves their
/// latest values as a JSON snapshot over a REST API.
#[derive(Parser, Debug)]
#[command(
    name = "sluice",
    author = "Sylvex <contact@sylvex.io>",
    version = sluice_core::VERSION,
    about = "OPC UA to HTTP process-value bridge",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "sluice.yaml",
        env = "SLUICE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "SLUICE_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "SLUICE_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Enable quiet mode (warnings and errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the bridge
    ///
    /// This is the default command when no subcommand is specified. It
    /// connects to the OPC UA source, starts the poll loop, and serves the
    /// REST API.
    Run,

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration without starting the bridge.
    /// Useful for checking a file before deployment.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Show the parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parses CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the effective command, defaulting to `Run`.
    pub fn effective_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Returns the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["sluice"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["sluice", "run"]);
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["sluice", "validate", "--show-config"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["sluice", "-c", "/etc/sluice/bridge.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/sluice/bridge.yaml"));
    }

    #[test]
    fn test_quiet_mode() {
        let cli = Cli::parse_from(["sluice", "-q"]);
        assert_eq!(cli.effective_log_level(), "warn");
    }

    #[test]
    fn test_verbose_mode() {
        let cli = Cli::parse_from(["sluice", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");
    }

    #[test]
    fn test_validate_json_format() {
        let cli = Cli::parse_from(["sluice", "validate", "-f", "json"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert_eq!(args.format, OutputFormat::Json);
        } else {
            panic!("Expected Validate command");
        }
    }
}
