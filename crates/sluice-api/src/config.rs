// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

// =============================================================================
// ApiConfig
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address.
    pub bind_address: String,

    /// Listen port.
    pub port: u16,

    /// Per-request deadline.
    pub request_timeout: Duration,

    /// CORS settings.
    pub cors: CorsConfig,
}

impl ApiConfig {
    /// Returns the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns an internal error if `bind_address` is not a valid IP address.
    pub fn socket_addr(&self) -> ApiResult<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|_| {
            ApiError::internal(format!("invalid bind address '{}'", self.bind_address))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout: Duration::from_secs(10),
            cors: CorsConfig::default(),
        }
    }
}

// =============================================================================
// CorsConfig
// =============================================================================

/// CORS settings for browser-hosted consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Whether cross-origin requests are allowed at all.
    pub enabled: bool,

    /// Allowed origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Returns `true` if any origin is allowed.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
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
    fn test_socket_addr() {
        let config = ApiConfig {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            ..ApiConfig::default()
        };
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = ApiConfig {
            bind_address: "not-an-ip".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_cors_any_origin() {
        assert!(CorsConfig::default().allows_any_origin());

        let restricted = CorsConfig {
            enabled: true,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        };
        assert!(!restricted.allows_any_origin());
    }
}
