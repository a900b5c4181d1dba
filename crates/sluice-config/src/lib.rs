// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # sluice-config
//!
//! Configuration schema, loading, and validation for the SLUICE bridge.
//!
//! Supports YAML, TOML, and JSON files (chosen by extension) plus `SLUICE_*`
//! environment variable overrides for deployment-specific scalars.
//!
//! ## Example
//!
//! ```no_run
//! use sluice_config::load_config;
//!
//! let config = load_config("sluice.yaml").unwrap();
//! println!("{} tags configured", config.tags.len());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader};
pub use schema::{
    BackoffSection, GatewayConfig, HttpConfig, PollSection, SecurityMode, SecurityPolicy,
    SluiceConfig, SourceConfig, TagEntry,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
