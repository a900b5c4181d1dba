// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for SLUICE.
//!
//! # Loading Pipeline
//!
//! 1. Parse the YAML/TOML/JSON file into [`SluiceConfig`]
//! 2. Apply environment variable overrides
//! 3. Validate
//!
//! # Environment Variable Overrides
//!
//! Deployment-specific scalars can be overridden without editing the file:
//!
//! ```text
//! SLUICE_SOURCE_ENDPOINT=opc.tcp://10.0.0.5:4840
//! SLUICE_SOURCE_USERNAME=operator
//! SLUICE_SOURCE_PASSWORD=secret
//! SLUICE_HTTP_BIND_ADDRESS=127.0.0.1
//! SLUICE_HTTP_PORT=8080
//! SLUICE_POLL_INTERVAL_MS=500
//! ```

use std::env;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::SluiceConfig;

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML (`.yaml`, `.yml`).
    Yaml,
    /// TOML (`.toml`).
    Toml,
    /// JSON (`.json`).
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path's extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader with environment override support.
///
/// # Examples
///
/// ```no_run
/// use sluice_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("sluice.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to apply environment overrides.
    apply_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with the default `SLUICE` prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: "SLUICE".to_string(),
            apply_env: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment overrides.
    pub fn with_env_overrides(mut self, enabled: bool) -> Self {
        self.apply_env = enabled;
        self
    }

    /// Loads and validates configuration from a file.
    ///
    /// The format is chosen by file extension (`.yaml`/`.yml`, `.toml`,
    /// `.json`).
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<SluiceConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let format = ConfigFormat::from_path(path)?;
        let mut config = parse(&content, format)
            .map_err(|message| ConfigError::parse(path, message))?;

        if self.apply_env {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;

        info!(
            tags = config.tags.len(),
            endpoint = %config.source.endpoint,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Loads and validates configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<SluiceConfig> {
        let mut config = parse(content, format)
            .map_err(|message| ConfigError::parse("<inline>", message))?;

        if self.apply_env {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Applies `<PREFIX>_*` environment overrides to scalar fields.
    fn apply_env_overrides(&self, config: &mut SluiceConfig) -> ConfigResult<()> {
        if let Some(endpoint) = self.env_var("SOURCE_ENDPOINT") {
            debug!("Overriding source.endpoint from environment");
            config.source.endpoint = endpoint;
        }
        if let Some(username) = self.env_var("SOURCE_USERNAME") {
            config.source.username = Some(username);
        }
        if let Some(password) = self.env_var("SOURCE_PASSWORD") {
            config.source.password = Some(password);
        }
        if let Some(bind) = self.env_var("HTTP_BIND_ADDRESS") {
            config.http.bind_address = bind;
        }
        if let Some(port) = self.env_var("HTTP_PORT") {
            let name = format!("{}_HTTP_PORT", self.env_prefix);
            config.http.port = port
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "not a valid port"))?;
        }
        if let Some(interval) = self.env_var("POLL_INTERVAL_MS") {
            let name = format!("{}_POLL_INTERVAL_MS", self.env_prefix);
            config.poll.interval_ms = interval
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "not a valid integer"))?;
        }
        Ok(())
    }

    fn env_var(&self, suffix: &str) -> Option<String> {
        env::var(format!("{}_{}", self.env_prefix, suffix)).ok()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn parse(content: &str, format: ConfigFormat) -> Result<SluiceConfig, String> {
    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default loader settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<SluiceConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with default loader settings.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<SluiceConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML_CONFIG: &str = r#"
source:
  endpoint: "opc.tcp://localhost:4840"

tags:
  - name: FlowTransmitter
    address: "ns=2;s=Flow.PV"
    unit: "L/min"
  - name: Pressure
    address: "ns=2;s=Press.PV"
    unit: "bar"
    scale: 0.01
    decimals: 2

http:
  port: 5050
"#;

    const TOML_CONFIG: &str = r#"
[source]
endpoint = "opc.tcp://localhost:4840"

[[tags]]
name = "FlowTransmitter"
address = "ns=2;s=Flow.PV"
unit = "L/min"

[http]
port = 5050
"#;

    #[test]
    fn test_load_yaml_from_str() {
        let config = load_config_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.source.endpoint, "opc.tcp://localhost:4840");
        assert_eq!(config.tags.len(), 2);
        assert_eq!(config.tags[1].scale, Some(0.01));
        assert_eq!(config.http.port, 5050);
        // Defaults fill the rest
        assert_eq!(config.poll.interval_ms, 1000);
    }

    #[test]
    fn test_load_toml_from_str() {
        let config = load_config_str(TOML_CONFIG, ConfigFormat::Toml).unwrap();
        assert_eq!(config.tags.len(), 1);
        assert_eq!(config.http.port, 5050);
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sluice.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(YAML_CONFIG.as_bytes()).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.tags.len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sluice.ini");
        std::fs::write(&path, "whatever").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = load_config_str("source: [unclosed", ConfigFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_config_rejected_on_load() {
        // Parses fine, fails validation (duplicate tag names)
        let yaml = r#"
source:
  endpoint: "opc.tcp://localhost:4840"
tags:
  - name: Flow
    address: "ns=2;i=1"
  - name: Flow
    address: "ns=2;i=2"
"#;
        let err = load_config_str(yaml, ConfigFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTag { .. }));
    }

    #[test]
    fn test_env_override() {
        // Unique prefix keeps this test independent of the others.
        std::env::set_var("SLUICE_TEST_A_SOURCE_ENDPOINT", "opc.tcp://override:4840");
        std::env::set_var("SLUICE_TEST_A_HTTP_PORT", "9090");

        let loader = ConfigLoader::new().with_env_prefix("SLUICE_TEST_A");
        let config = loader.load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.source.endpoint, "opc.tcp://override:4840");
        assert_eq!(config.http.port, 9090);

        std::env::remove_var("SLUICE_TEST_A_SOURCE_ENDPOINT");
        std::env::remove_var("SLUICE_TEST_A_HTTP_PORT");
    }

    #[test]
    fn test_env_override_invalid_port() {
        std::env::set_var("SLUICE_TEST_B_HTTP_PORT", "not-a-port");

        let loader = ConfigLoader::new().with_env_prefix("SLUICE_TEST_B");
        let err = loader
            .load_from_str(YAML_CONFIG, ConfigFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));

        std::env::remove_var("SLUICE_TEST_B_HTTP_PORT");
    }

    #[test]
    fn test_env_overrides_disabled() {
        std::env::set_var("SLUICE_TEST_C_HTTP_PORT", "9090");

        let loader = ConfigLoader::new()
            .with_env_prefix("SLUICE_TEST_C")
            .with_env_overrides(false);
        let config = loader.load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.http.port, 5050);

        std::env::remove_var("SLUICE_TEST_C_HTTP_PORT");
    }
}
