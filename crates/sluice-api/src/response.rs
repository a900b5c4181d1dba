// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.
//!
//! The snapshot endpoints (`/api/values`, `/api/values/{name}`) emit the
//! bare wire format consumers poll; the operational endpoints use the typed
//! responses defined here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sluice_core::poller::PollerState;

// =============================================================================
// ApiResponse
// =============================================================================

/// Generic wrapper for operational endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful.
    pub success: bool,

    /// Response data (if successful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error message (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

// =============================================================================
// Error Response
// =============================================================================

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetails,
}

/// Error details.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Stable error code for programmatic handling.
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

// =============================================================================
// Typed Responses
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,

    /// Version string.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Readiness check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the bridge is serving live data.
    pub ready: bool,

    /// Component statuses.
    pub components: Vec<ComponentStatus>,
}

/// Status of one component.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// Component name.
    pub name: String,

    /// Whether the component is healthy.
    pub healthy: bool,

    /// Optional detail message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    /// Creates a component status.
    pub fn new(name: impl Into<String>, healthy: bool) -> Self {
        Self {
            name: name.into(),
            healthy,
            message: None,
        }
    }

    /// Attaches a detail message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Bridge status response (`/api/status`).
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Poller loop state.
    pub poller_state: PollerState,

    /// Completed poll cycles.
    pub cycles: u64,

    /// Reconnect transitions.
    pub reconnects: u64,

    /// Completion time of the most recent cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle_at: Option<DateTime<Utc>>,

    /// Number of registered tags.
    pub tags_configured: usize,

    /// Number of tags with at least one successful read.
    pub tags_published: usize,

    /// Per-tag read failure counters (only tags that ever failed).
    pub read_failures: BTreeMap<String, u64>,

    /// Process start time.
    pub started_at: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<()> = ApiResponse::error("went sideways");
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("went sideways"));
    }

    #[test]
    fn test_error_response_shape() {
        let response = ErrorResponse::new("NOT_FOUND", "tag 'Flow' not found");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[test]
    fn test_health_response() {
        let response = HealthResponse::healthy();
        assert_eq!(response.status, "ok");
        assert!(!response.version.is_empty());
    }
}
