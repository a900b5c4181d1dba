// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA-specific types.
//!
//! - **NodeId**: node identifiers with `ns=2;s=...` parsing and validation
//! - **SecurityMode/SecurityPolicy**: pass-through security configuration
//! - **IdentityToken**: anonymous or username/password session identity
//! - **OpcUaConfig**: client connection configuration with builder
//!
//! # Examples
//!
//! ```
//! use sluice_opcua::types::{NodeId, OpcUaConfig};
//!
//! let node: NodeId = "ns=2;s=Flow.PV".parse().unwrap();
//! assert_eq!(node.namespace_index, 2);
//!
//! let config = OpcUaConfig::builder()
//!     .endpoint("opc.tcp://localhost:4840")
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OpcUaError;

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier: a namespace index plus a numeric, string, or GUID
/// identifier.
///
/// # Examples
///
/// ```
/// use sluice_opcua::types::NodeId;
///
/// let numeric = NodeId::numeric(2, 1001);
/// assert_eq!(numeric.to_string(), "ns=2;i=1001");
///
/// let parsed: NodeId = "ns=3;s=Pump.Speed".parse().unwrap();
/// assert_eq!(parsed.to_string(), "ns=3;s=Pump.Speed");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

/// The identifier portion of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NodeIdentifier {
    /// Numeric identifier (`i=1001`).
    Numeric(u32),

    /// String identifier (`s=Flow.PV`).
    String(String),

    /// GUID identifier (`g=...`).
    Guid(Uuid),
}

impl NodeId {
    /// Creates a numeric node id.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node id.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Returns the numeric identifier, if this is a numeric node id.
    pub fn as_numeric(&self) -> Option<u32> {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string identifier, if this is a string node id.
    pub fn as_string(&self) -> Option<&str> {
        match &self.identifier {
            NodeIdentifier::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identifier {
            NodeIdentifier::Numeric(v) => write!(f, "ns={};i={}", self.namespace_index, v),
            NodeIdentifier::String(v) => write!(f, "ns={};s={}", self.namespace_index, v),
            NodeIdentifier::Guid(v) => write!(f, "ns={};g={}", self.namespace_index, v),
        }
    }
}

impl FromStr for NodeId {
    type Err = OpcUaError;

    /// Parses the standard OPC UA string form.
    ///
    /// Accepted shapes: `ns=<n>;i=<num>`, `ns=<n>;s=<string>`,
    /// `ns=<n>;g=<guid>`, and the namespace-0 shorthand without the `ns=`
    /// part (`i=2258`, `s=Name`).
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| OpcUaError::invalid_node_id(input, message);

        let (namespace_index, rest) = match input.strip_prefix("ns=") {
            Some(tail) => {
                let (ns, rest) = tail
                    .split_once(';')
                    .ok_or_else(|| invalid("missing ';' after namespace"))?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| invalid("namespace index is not a u16"))?;
                (ns, rest)
            }
            None => (0, input),
        };

        let (kind, value) = rest
            .split_once('=')
            .ok_or_else(|| invalid("missing identifier part"))?;

        if value.is_empty() {
            return Err(invalid("empty identifier"));
        }

        let identifier = match kind {
            "i" => NodeIdentifier::Numeric(
                value
                    .parse()
                    .map_err(|_| invalid("numeric identifier is not a u32"))?,
            ),
            "s" => NodeIdentifier::String(value.to_string()),
            "g" => NodeIdentifier::Guid(
                Uuid::parse_str(value).map_err(|_| invalid("identifier is not a valid GUID"))?,
            ),
            _ => return Err(invalid("unknown identifier type (expected i=, s=, or g=)")),
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// Security
// =============================================================================

/// OPC UA message security mode, passed through to the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
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

impl SecurityMode {
    /// Returns the OPC UA name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Sign => "Sign",
            Self::SignAndEncrypt => "SignAndEncrypt",
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// OPC UA security policy, passed through to the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SecurityPolicy {
    /// No security.
    #[default]
    None,

    /// Basic128Rsa15 (deprecated by the spec, still common in the field).
    Basic128Rsa15,

    /// Basic256 (deprecated by the spec, still common in the field).
    Basic256,

    /// Basic256Sha256.
    Basic256Sha256,

    /// Aes128-Sha256-RsaOaep.
    Aes128Sha256RsaOaep,

    /// Aes256-Sha256-RsaPss.
    Aes256Sha256RsaPss,
}

impl SecurityPolicy {
    /// Returns the policy name as used in endpoint descriptions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Basic128Rsa15 => "Basic128Rsa15",
            Self::Basic256 => "Basic256",
            Self::Basic256Sha256 => "Basic256Sha256",
            Self::Aes128Sha256RsaOaep => "Aes128-Sha256-RsaOaep",
            Self::Aes256Sha256RsaPss => "Aes256-Sha256-RsaPss",
        }
    }
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityToken {
    /// Anonymous session.
    #[default]
    Anonymous,

    /// Username/password session.
    UsernamePassword {
        /// User name.
        username: String,
        /// Password.
        password: String,
    },
}

impl IdentityToken {
    /// Returns `true` if this is an anonymous identity.
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

// =============================================================================
// OpcUaConfig
// =============================================================================

/// Client connection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpcUaConfig {
    /// Server endpoint URL (`opc.tcp://host:port[/path]`).
    pub endpoint: String,

    /// Application name announced to the server.
    pub application_name: String,

    /// Application URI announced to the server.
    pub application_uri: String,

    /// Message security mode.
    pub security_mode: SecurityMode,

    /// Security policy.
    pub security_policy: SecurityPolicy,

    /// Session identity.
    pub identity: IdentityToken,

    /// Whether to trust the server certificate without a PKI store.
    pub trust_server_certs: bool,

    /// Deadline for establishing the connection and session.
    pub connect_timeout: Duration,

    /// Deadline for a single read service call.
    pub request_timeout: Duration,
}

impl OpcUaConfig {
    /// Creates a configuration with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration builder.
    pub fn builder() -> OpcUaConfigBuilder {
        OpcUaConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OpcUaError::Configuration`] for an empty or non-`opc.tcp`
    /// endpoint or zero timeouts.
    pub fn validate(&self) -> Result<(), OpcUaError> {
        if self.endpoint.is_empty() {
            return Err(OpcUaError::configuration("endpoint must not be empty"));
        }
        if !self.endpoint.starts_with("opc.tcp://") {
            return Err(OpcUaError::configuration(format!(
                "endpoint '{}' must start with opc.tcp://",
                self.endpoint
            )));
        }
        if self.connect_timeout.is_zero() {
            return Err(OpcUaError::configuration("connect_timeout must be > 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(OpcUaError::configuration("request_timeout must be > 0"));
        }
        Ok(())
    }

    /// Returns `true` if the session uses any message security.
    #[inline]
    pub fn uses_security(&self) -> bool {
        self.security_mode != SecurityMode::None
    }
}

impl Default for OpcUaConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            application_name: "SLUICE Bridge".to_string(),
            application_uri: "urn:sylvex:sluice".to_string(),
            security_mode: SecurityMode::None,
            security_policy: SecurityPolicy::None,
            identity: IdentityToken::Anonymous,
            trust_server_certs: true,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Builder for [`OpcUaConfig`].
#[derive(Debug, Default)]
pub struct OpcUaConfigBuilder {
    config: OpcUaConfig,
}

impl OpcUaConfigBuilder {
    /// Sets the endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Sets the application name.
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.config.application_name = name.into();
        self
    }

    /// Sets the application URI.
    pub fn application_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.application_uri = uri.into();
        self
    }

    /// Sets the security mode.
    pub fn security_mode(mut self, mode: SecurityMode) -> Self {
        self.config.security_mode = mode;
        self
    }

    /// Sets the security policy.
    pub fn security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.config.security_policy = policy;
        self
    }

    /// Uses an anonymous session identity.
    pub fn anonymous(mut self) -> Self {
        self.config.identity = IdentityToken::Anonymous;
        self
    }

    /// Uses a username/password session identity.
    pub fn username(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.identity = IdentityToken::UsernamePassword {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sets whether to trust server certificates without a PKI store.
    pub fn trust_server_certs(mut self, trust: bool) -> Self {
        self.config.trust_server_certs = trust;
        self
    }

    /// Sets the connect deadline.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the read service-call deadline.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<OpcUaConfig, OpcUaError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::numeric(2, 1001).to_string(), "ns=2;i=1001");
        assert_eq!(NodeId::string(3, "Flow.PV").to_string(), "ns=3;s=Flow.PV");
    }

    #[test]
    fn test_node_id_parse_numeric() {
        let node: NodeId = "ns=2;i=1001".parse().unwrap();
        assert_eq!(node.namespace_index, 2);
        assert_eq!(node.as_numeric(), Some(1001));
    }

    #[test]
    fn test_node_id_parse_string() {
        let node: NodeId = "ns=4;s=Line1.Pump.Speed".parse().unwrap();
        assert_eq!(node.namespace_index, 4);
        assert_eq!(node.as_string(), Some("Line1.Pump.Speed"));
    }

    #[test]
    fn test_node_id_parse_guid() {
        let guid = "72962b91-fa75-4ae6-8d28-b404dc7daf63";
        let node: NodeId = format!("ns=1;g={}", guid).parse().unwrap();
        assert_eq!(node.to_string(), format!("ns=1;g={}", guid));
    }

    #[test]
    fn test_node_id_parse_namespace_zero_shorthand() {
        let node: NodeId = "i=2258".parse().unwrap();
        assert_eq!(node.namespace_index, 0);
        assert_eq!(node.as_numeric(), Some(2258));
    }

    #[test]
    fn test_node_id_parse_rejects_garbage() {
        assert!("".parse::<NodeId>().is_err());
        assert!("ns=2".parse::<NodeId>().is_err());
        assert!("ns=2;x=1".parse::<NodeId>().is_err());
        assert!("ns=2;i=notanumber".parse::<NodeId>().is_err());
        assert!("ns=70000;i=1".parse::<NodeId>().is_err());
        assert!("ns=2;s=".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_roundtrip() {
        for input in ["ns=2;i=42", "ns=0;s=Server.Status", "i=2258"] {
            let node: NodeId = input.parse().unwrap();
            let reparsed: NodeId = node.to_string().parse().unwrap();
            assert_eq!(node, reparsed);
        }
    }

    #[test]
    fn test_config_builder() {
        let config = OpcUaConfig::builder()
            .endpoint("opc.tcp://plc.local:4840")
            .security_mode(SecurityMode::Sign)
            .security_policy(SecurityPolicy::Basic256Sha256)
            .username("operator", "secret")
            .request_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        assert_eq!(config.endpoint, "opc.tcp://plc.local:4840");
        assert!(config.uses_security());
        assert!(!config.identity.is_anonymous());
        assert_eq!(config.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_config_validation() {
        assert!(OpcUaConfig::builder().build().is_err());

        assert!(OpcUaConfig::builder()
            .endpoint("http://not-opc:80")
            .build()
            .is_err());

        let zero_timeout = OpcUaConfig {
            endpoint: "opc.tcp://localhost:4840".to_string(),
            connect_timeout: Duration::ZERO,
            ..OpcUaConfig::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_security_names() {
        assert_eq!(SecurityMode::SignAndEncrypt.as_str(), "SignAndEncrypt");
        assert_eq!(SecurityPolicy::Basic256Sha256.as_str(), "Basic256Sha256");
        assert_eq!(
            SecurityPolicy::Aes128Sha256RsaOaep.as_str(),
            "Aes128-Sha256-RsaOaep"
        );
    }
}
