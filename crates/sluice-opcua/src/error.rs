// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA error types and status-code classification.
//!
//! The bridge only cares about one distinction (see the poller's state
//! machine): did the *session* die, or did a *single node* fail to read?
//! [`OpcUaError::is_session_level`] and [`is_session_status`] encode that
//! mapping from the OPC UA status-code taxonomy.

use std::time::Duration;

use thiserror::Error;

use sluice_core::error::SourceError;

/// Result type alias for OPC UA operations.
pub type OpcUaResult<T> = Result<T, OpcUaError>;

// =============================================================================
// Status codes
// =============================================================================

/// OPC UA status codes that indicate the session or secure channel is gone.
///
/// A service call failing with one of these means subsequent reads are
/// pointless until the client reconnects.
const SESSION_LEVEL_STATUS: &[u32] = &[
    0x8005_0000, // BadCommunicationError
    0x800A_0000, // BadTimeout
    0x800E_0000, // BadServerHalted
    0x8022_0000, // BadSecureChannelIdInvalid
    0x8025_0000, // BadSessionIdInvalid
    0x8026_0000, // BadSessionClosed
    0x8027_0000, // BadSessionNotActivated
    0x8086_0000, // BadSecureChannelClosed
    0x808A_0000, // BadNotConnected
    0x80AB_0000, // BadServerNotConnected
    0x80AC_0000, // BadConnectionRejected
    0x80AE_0000, // BadConnectionClosed
];

/// Returns `true` if the status code is bad (severity bit set).
#[inline]
pub fn is_bad_status(status: u32) -> bool {
    status & 0x8000_0000 != 0
}

/// Returns `true` if the status code invalidates the whole session.
#[inline]
pub fn is_session_status(status: u32) -> bool {
    SESSION_LEVEL_STATUS.contains(&status)
}

// =============================================================================
// OpcUaError
// =============================================================================

/// Errors from the OPC UA client stack.
#[derive(Debug, Clone, Error)]
pub enum OpcUaError {
    /// Failed to establish the connection or session.
    #[error("Failed to connect to '{endpoint}': {message}")]
    Connect {
        /// Target endpoint URL.
        endpoint: String,
        /// Human-readable description.
        message: String,
    },

    /// The established session failed.
    #[error("Session failure: {message}")]
    Session {
        /// Human-readable description.
        message: String,
    },

    /// A service call failed with an OPC UA status code.
    #[error("Service call failed with status 0x{status:08X}")]
    Service {
        /// The OPC UA status code.
        status: u32,
    },

    /// An operation exceeded its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// A tag address is not a valid node id.
    #[error("Invalid node id '{input}': {message}")]
    InvalidNodeId {
        /// The offending address string.
        input: String,
        /// What is wrong with it.
        message: String,
    },

    /// The configuration is unusable.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable description.
        message: String,
    },

    /// The client was used before `connect` succeeded.
    #[error("Not connected")]
    NotConnected,
}

impl OpcUaError {
    /// Creates a connect error.
    pub fn connect(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a session error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Creates a service error from a status code.
    pub fn service(status: u32) -> Self {
        Self::Service { status }
    }

    /// Creates an invalid-node-id error.
    pub fn invalid_node_id(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this failure invalidates the whole session.
    pub fn is_session_level(&self) -> bool {
        match self {
            OpcUaError::Connect { .. }
            | OpcUaError::Session { .. }
            | OpcUaError::Timeout(_)
            | OpcUaError::NotConnected => true,
            OpcUaError::Service { status } => is_session_status(*status),
            OpcUaError::InvalidNodeId { .. } | OpcUaError::Configuration { .. } => false,
        }
    }
}

impl From<OpcUaError> for SourceError {
    /// Maps OPC UA failures into the two classes the poller distinguishes.
    fn from(err: OpcUaError) -> Self {
        match &err {
            OpcUaError::Timeout(d) => SourceError::Timeout(*d),
            OpcUaError::NotConnected => SourceError::NotConnected,
            _ if err.is_session_level() => SourceError::connection(err.to_string()),
            _ => SourceError::protocol(err.to_string()),
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
    fn test_status_classification() {
        assert!(is_bad_status(0x8025_0000));
        assert!(!is_bad_status(0x0000_0000));

        // BadSessionIdInvalid kills the session
        assert!(is_session_status(0x8025_0000));
        // BadNodeIdUnknown does not
        assert!(!is_session_status(0x8034_0000));
    }

    #[test]
    fn test_session_level_errors() {
        assert!(OpcUaError::connect("opc.tcp://x", "refused").is_session_level());
        assert!(OpcUaError::Timeout(Duration::from_secs(1)).is_session_level());
        assert!(OpcUaError::service(0x80AE_0000).is_session_level());

        assert!(!OpcUaError::service(0x8034_0000).is_session_level());
        assert!(!OpcUaError::invalid_node_id("x", "bad").is_session_level());
    }

    #[test]
    fn test_conversion_to_source_error() {
        let err: SourceError = OpcUaError::Timeout(Duration::from_secs(3)).into();
        assert!(err.is_connection_loss());

        let err: SourceError = OpcUaError::session("channel closed").into();
        assert!(err.is_connection_loss());

        let err: SourceError = OpcUaError::invalid_node_id("zz", "unparseable").into();
        assert!(!err.is_connection_loss());
    }
}
