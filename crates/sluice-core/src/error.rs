// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core error taxonomy for SLUICE.
//!
//! Two families of failures matter to the bridge:
//!
//! - [`RegistryError`]: malformed tag definitions. Fatal at startup, the
//!   process refuses to run with a broken registry.
//! - [`SourceError`]: failures talking to the data source. Never fatal; the
//!   poller either retains the stale value (per-tag read failures) or enters
//!   its reconnect loop (connection-level failures).

use std::time::Duration;
use thiserror::Error;

/// Result type alias for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

// =============================================================================
// RegistryError
// =============================================================================

/// Errors building the tag registry from configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two tag entries share the same name.
    #[error("Duplicate tag name: {name}")]
    DuplicateTag {
        /// The duplicated tag name.
        name: String,
    },

    /// A tag entry has an empty name.
    #[error("Tag entry #{index} has an empty name")]
    EmptyName {
        /// Zero-based position of the entry in the configuration.
        index: usize,
    },

    /// A tag entry has an empty source address.
    #[error("Tag '{name}' has an empty address")]
    EmptyAddress {
        /// The tag name.
        name: String,
    },
}

impl RegistryError {
    /// Creates a duplicate-tag error.
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateTag { name: name.into() }
    }

    /// Creates an empty-address error.
    pub fn empty_address(name: impl Into<String>) -> Self {
        Self::EmptyAddress { name: name.into() }
    }
}

// =============================================================================
// SourceError
// =============================================================================

/// Errors raised by a data-source client.
///
/// The variants encode the distinction the poller's state machine depends on:
/// [`SourceError::is_connection_loss`] decides between "retain stale value,
/// keep polling" and "tear down the session and reconnect".
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The source is unreachable or rejected the session.
    #[error("Connection failed: {message}")]
    Connection {
        /// Human-readable description.
        message: String,
    },

    /// A single address could not be read.
    ///
    /// The session itself is still healthy; other addresses in the same
    /// cycle may have succeeded.
    #[error("Read failed for '{address}': {message}")]
    Read {
        /// The address that failed.
        address: String,
        /// Human-readable description.
        message: String,
    },

    /// An operation exceeded its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The client was used before `connect` succeeded.
    #[error("Not connected to the source")]
    NotConnected,

    /// The source answered with something the client cannot interpret.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Human-readable description.
        message: String,
    },
}

impl SourceError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a per-address read error.
    pub fn read_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Read {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns `true` if this failure invalidates the whole session.
    ///
    /// Connection losses make the poller close the client, back off, and
    /// reconnect. Per-address read errors and protocol-level value problems
    /// do not; a hung session (timeout) cannot be told apart from a dead one
    /// and is treated as lost.
    #[inline]
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            SourceError::Connection { .. } | SourceError::Timeout(_) | SourceError::NotConnected
        )
    }

    /// Returns a stable identifier for this error kind, for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            SourceError::Connection { .. } => "connection",
            SourceError::Read { .. } => "read",
            SourceError::Timeout(_) => "timeout",
            SourceError::NotConnected => "not_connected",
            SourceError::Protocol { .. } => "protocol",
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
    fn test_registry_error_display() {
        let err = RegistryError::duplicate("Flow");
        assert_eq!(err.to_string(), "Duplicate tag name: Flow");

        let err = RegistryError::EmptyName { index: 2 };
        assert_eq!(err.to_string(), "Tag entry #2 has an empty name");
    }

    #[test]
    fn test_connection_loss_classification() {
        assert!(SourceError::connection("refused").is_connection_loss());
        assert!(SourceError::timeout(Duration::from_secs(5)).is_connection_loss());
        assert!(SourceError::NotConnected.is_connection_loss());

        assert!(!SourceError::read_failed("ns=2;i=1", "bad node").is_connection_loss());
        assert!(!SourceError::protocol("unexpected variant").is_connection_loss());
    }

    #[test]
    fn test_error_types() {
        assert_eq!(SourceError::connection("x").error_type(), "connection");
        assert_eq!(SourceError::read_failed("a", "b").error_type(), "read");
        assert_eq!(
            SourceError::timeout(Duration::from_millis(100)).error_type(),
            "timeout"
        );
    }
}
