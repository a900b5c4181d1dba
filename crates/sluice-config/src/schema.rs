// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for the SLUICE bridge.
//!
//! The schema mirrors the deployment file operators write:
//!
//! ```yaml
//! gateway:
//!   id: plant-a-bridge
//!
//! source:
//!   endpoint: "opc.tcp://192.168.1.50:4840"
//!   security_policy: none
//!   security_mode: none
//!
//! poll:
//!   interval_ms: 1000
//!
//! tags:
//!   - name: FlowTransmitter
//!     address: "ns=2;s=Flow.PV"
//!     unit: "L/min"
//!   - name: Pressure
//!     address: "ns=2;s=Press.PV"
//!     unit: "bar"
//!
//! http:
//!   bind_address: "0.0.0.0"
//!   port: 5000
//! ```
//!
//! Every section validates itself; `SluiceConfig::validate` runs them all
//! and additionally rejects duplicate tag names, which would otherwise
//! silently shadow each other in the cache.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use sluice_core::poller::{BackoffConfig, PollConfig};
use sluice_core::registry::TagSpec;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// SluiceConfig
// =============================================================================

/// Root configuration for the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SluiceConfig {
    /// Gateway identity.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// OPC UA source connection.
    pub source: SourceConfig,

    /// Poll loop timing.
    #[serde(default)]
    pub poll: PollSection,

    /// Monitored tags.
    #[serde(default)]
    pub tags: Vec<TagEntry>,

    /// HTTP server.
    #[serde(default)]
    pub http: HttpConfig,
}

impl SluiceConfig {
    /// Validates the whole configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.gateway.validate()?;
        self.source.validate()?;
        self.poll.validate()?;
        self.http.validate()?;

        let mut seen = HashSet::new();
        for (index, tag) in self.tags.iter().enumerate() {
            tag.validate(index)?;
            if !seen.insert(tag.name.as_str()) {
                return Err(ConfigError::duplicate_tag(&tag.name));
            }
        }

        Ok(())
    }

    /// Converts the tag entries into registry specs.
    pub fn tag_specs(&self) -> Vec<TagSpec> {
        self.tags.iter().map(TagEntry::to_spec).collect()
    }

    /// Converts the poll section into the poller's configuration.
    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.poll.interval(),
            backoff: BackoffConfig {
                initial_delay: Duration::from_millis(self.poll.backoff.initial_delay_ms),
                multiplier: self.poll.backoff.multiplier,
                max_delay: Duration::from_millis(self.poll.backoff.max_delay_ms),
            },
        }
    }
}

impl Default for SluiceConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            source: SourceConfig::default(),
            poll: PollSection::default(),
            tags: Vec::new(),
            http: HttpConfig::default(),
        }
    }
}

// =============================================================================
// GatewayConfig
// =============================================================================

/// Gateway identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Stable identifier for this bridge instance.
    #[serde(default = "default_gateway_id")]
    pub id: String,

    /// Human-readable name.
    #[serde(default = "default_gateway_name")]
    pub name: String,
}

fn default_gateway_id() -> String {
    "sluice-01".to_string()
}

fn default_gateway_name() -> String {
    "SLUICE Bridge".to_string()
}

impl GatewayConfig {
    /// Validates the section.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.id.is_empty() {
            return Err(ConfigError::validation("gateway.id", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            id: default_gateway_id(),
            name: default_gateway_name(),
        }
    }
}

// =============================================================================
// SourceConfig
// =============================================================================

/// OPC UA source connection settings.
///
/// Security settings are passed through to the OPC UA stack unmodified; the
/// bridge takes no part in the negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Server endpoint URL (`opc.tcp://host:port[/path]`).
    #[serde(default)]
    pub endpoint: String,

    /// Application name announced to the server.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Application URI announced to the server.
    #[serde(default = "default_application_uri")]
    pub application_uri: String,

    /// Security policy.
    #[serde(default)]
    pub security_policy: SecurityPolicy,

    /// Message security mode.
    #[serde(default)]
    pub security_mode: SecurityMode,

    /// Session user name; anonymous when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Session password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Whether to trust the server certificate without a PKI store.
    #[serde(default = "default_true")]
    pub trust_server_certs: bool,

    /// Deadline for establishing the connection, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Deadline for one read service call, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_application_name() -> String {
    "SLUICE Bridge".to_string()
}

fn default_application_uri() -> String {
    "urn:sylvex:sluice".to_string()
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

impl SourceConfig {
    /// Validates the section.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::missing_field("source.endpoint"));
        }
        if !self.endpoint.starts_with("opc.tcp://") {
            return Err(ConfigError::validation(
                "source.endpoint",
                "must start with opc.tcp://",
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "source.connect_timeout_ms",
                "must be > 0",
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "source.request_timeout_ms",
                "must be > 0",
            ));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::validation(
                "source.username",
                "username and password must be set together",
            ));
        }
        Ok(())
    }

    /// Connect deadline as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Read service-call deadline as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            application_name: default_application_name(),
            application_uri: default_application_uri(),
            security_policy: SecurityPolicy::default(),
            security_mode: SecurityMode::default(),
            username: None,
            password: None,
            trust_server_certs: true,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// OPC UA security policy names accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityPolicy {
    /// No security.
    #[default]
    None,
    /// Basic128Rsa15.
    Basic128Rsa15,
    /// Basic256.
    Basic256,
    /// Basic256Sha256.
    Basic256Sha256,
    /// Aes128-Sha256-RsaOaep.
    Aes128Sha256RsaOaep,
    /// Aes256-Sha256-RsaPss.
    Aes256Sha256RsaPss,
}

/// OPC UA message security modes accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    /// No message security.
    #[default]
    None,
    /// Messages are signed.
    Sign,
    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

// =============================================================================
// PollSection
// =============================================================================

/// Poll loop timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollSection {
    /// Fixed period between poll cycles, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Reconnect backoff policy.
    #[serde(default)]
    pub backoff: BackoffSection,
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

impl PollSection {
    /// Validates the section.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.interval_ms == 0 {
            return Err(ConfigError::validation("poll.interval_ms", "must be > 0"));
        }
        if self.backoff.initial_delay_ms == 0 {
            return Err(ConfigError::validation(
                "poll.backoff.initial_delay_ms",
                "must be > 0",
            ));
        }
        if self.backoff.multiplier < 1.0 {
            return Err(ConfigError::validation(
                "poll.backoff.multiplier",
                "must be >= 1.0",
            ));
        }
        if self.backoff.max_delay_ms < self.backoff.initial_delay_ms {
            return Err(ConfigError::validation(
                "poll.backoff.max_delay_ms",
                "must be >= initial_delay_ms",
            ));
        }
        Ok(())
    }

    /// Poll period as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            backoff: BackoffSection::default(),
        }
    }
}

/// Reconnect backoff settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffSection {
    /// Delay before the first reconnect attempt, in milliseconds.
    #[serde(default = "default_backoff_initial_ms")]
    pub initial_delay_ms: u64,

    /// Multiplier applied after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub multiplier: f64,

    /// Upper bound on the delay, in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub max_delay_ms: u64,
}

fn default_backoff_initial_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_backoff_max_ms() -> u64 {
    30_000
}

impl Default for BackoffSection {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_backoff_initial_ms(),
            multiplier: default_backoff_multiplier(),
            max_delay_ms: default_backoff_max_ms(),
        }
    }
}

// =============================================================================
// TagEntry
// =============================================================================

/// One monitored tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagEntry {
    /// Unique logical name; cache key and JSON field key.
    pub name: String,

    /// OPC UA node id (`ns=2;s=Flow.PV`).
    pub address: String,

    /// Display unit, passed through to consumers unmodified.
    #[serde(default)]
    pub unit: String,

    /// Optional multiplier applied to the raw reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,

    /// Optional number of decimal places the published value is rounded to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u32>,
}

impl TagEntry {
    /// Validates this entry.
    pub fn validate(&self, index: usize) -> ConfigResult<()> {
        if self.name.is_empty() {
            return Err(ConfigError::validation(
                format!("tags[{}].name", index),
                "must not be empty",
            ));
        }
        if self.address.is_empty() {
            return Err(ConfigError::validation(
                format!("tags[{}].address", index),
                "must not be empty",
            ));
        }
        if let Some(scale) = self.scale {
            if scale == 0.0 || !scale.is_finite() {
                return Err(ConfigError::validation(
                    format!("tags[{}].scale", index),
                    "must be finite and non-zero",
                ));
            }
        }
        Ok(())
    }

    /// Converts this entry into a registry spec.
    pub fn to_spec(&self) -> TagSpec {
        let mut spec = TagSpec::new(self.name.as_str(), self.address.as_str())
            .with_unit(self.unit.as_str());
        if let Some(scale) = self.scale {
            spec = spec.with_scale(scale);
        }
        if let Some(decimals) = self.decimals {
            spec = spec.with_decimals(decimals);
        }
        spec
    }
}

// =============================================================================
// HttpConfig
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Listen port.
    #[serde(default = "default_http_port")]
    pub port: u16,

    /// Per-request deadline, in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Whether cross-origin requests are allowed.
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; `*` allows any.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    5000
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl HttpConfig {
    /// Validates the section.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bind_address.is_empty() {
            return Err(ConfigError::validation(
                "http.bind_address",
                "must not be empty",
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::validation("http.port", "must be > 0"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "http.request_timeout_ms",
                "must be > 0",
            ));
        }
        Ok(())
    }

    /// Per-request deadline as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_http_port(),
            request_timeout_ms: default_http_timeout_ms(),
            cors_enabled: true,
            allowed_origins: default_allowed_origins(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> SluiceConfig {
        SluiceConfig {
            source: SourceConfig {
                endpoint: "opc.tcp://localhost:4840".to_string(),
                ..SourceConfig::default()
            },
            tags: vec![
                TagEntry {
                    name: "FlowTransmitter".to_string(),
                    address: "ns=2;s=Flow.PV".to_string(),
                    unit: "L/min".to_string(),
                    scale: None,
                    decimals: None,
                },
                TagEntry {
                    name: "Pressure".to_string(),
                    address: "ns=2;s=Press.PV".to_string(),
                    unit: "bar".to_string(),
                    scale: None,
                    decimals: None,
                },
            ],
            ..SluiceConfig::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn test_missing_endpoint_fails() {
        let config = SluiceConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_non_opc_endpoint_fails() {
        let mut config = valid_config();
        config.source.endpoint = "http://localhost:8080".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_tags_fail() {
        let mut config = valid_config();
        config.tags.push(TagEntry {
            name: "Pressure".to_string(),
            address: "ns=2;s=Other".to_string(),
            unit: String::new(),
            scale: None,
            decimals: None,
        });

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTag { name } if name == "Pressure"));
    }

    #[test]
    fn test_zero_poll_interval_fails() {
        let mut config = valid_config();
        config.poll.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_username_without_password_fails() {
        let mut config = valid_config();
        config.source.username = Some("operator".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_scale_fails() {
        let mut config = valid_config();
        config.tags[0].scale = Some(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tag_specs_conversion() {
        let config = valid_config();
        let specs = config.tag_specs();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name.as_str(), "FlowTransmitter");
        assert_eq!(specs[0].unit, "L/min");
    }

    #[test]
    fn test_poll_config_conversion() {
        let config = valid_config();
        let poll = config.poll_config();
        assert_eq!(poll.interval, Duration::from_millis(1000));
        assert_eq!(poll.backoff.initial_delay, Duration::from_millis(500));
        assert_eq!(poll.backoff.max_delay, Duration::from_millis(30_000));
    }

    #[test]
    fn test_defaults() {
        let http = HttpConfig::default();
        assert_eq!(http.port, 5000);
        assert!(http.cors_enabled);
        assert_eq!(http.allowed_origins, vec!["*".to_string()]);
    }
}
