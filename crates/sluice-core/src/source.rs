// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Data-source client abstraction.
//!
//! The poller only ever talks to the source through [`SourceClient`], so the
//! protocol stack stays swappable and the poll loop is testable with an
//! in-memory fake. The OPC UA implementation lives in `sluice-opcua`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceResult;
use crate::types::SourceValue;

// =============================================================================
// SourceState
// =============================================================================

/// Connection state of a source client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    /// Not connected.
    #[default]
    Disconnected,

    /// Connection is being established.
    Connecting,

    /// Connected and ready for reads.
    Connected,

    /// Re-establishing the connection after a failure.
    Reconnecting,

    /// Connection has failed.
    Failed,
}

impl SourceState {
    /// Returns `true` if the source is connected.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns `true` if the source is in a transitional state.
    #[inline]
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Reconnecting)
    }
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

// =============================================================================
// AddressRead
// =============================================================================

/// The per-address outcome of one batch read.
pub type AddressRead = (String, SourceResult<SourceValue>);

// =============================================================================
// SourceClient Trait
// =============================================================================

/// Abstract client for the industrial data source.
///
/// # Error contract
///
/// `read_values` separates the two failure classes the poller's state
/// machine distinguishes:
///
/// - a top-level `Err` means the session itself failed (connection loss,
///   timeout) and the poller should reconnect;
/// - an `Err` inside the returned vector means that one address could not be
///   read while the session stayed healthy, and the poller keeps the stale
///   cached value for that tag.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; connection state is interior so
/// the client can be driven through a shared reference.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Establishes the connection and session to the source.
    ///
    /// Implementations must bound this with a timeout; a connect that never
    /// completes is reported as [`crate::error::SourceError::Timeout`].
    async fn connect(&self) -> SourceResult<()>;

    /// Reads the current value of every given address in one operation.
    ///
    /// The result has one entry per requested address, in request order.
    async fn read_values(&self, addresses: &[String]) -> SourceResult<Vec<AddressRead>>;

    /// Releases the connection.
    ///
    /// Called on shutdown and before every reconnect attempt. Closing an
    /// already-closed client is a no-op.
    async fn close(&self) -> SourceResult<()>;

    /// Returns the current connection state.
    fn state(&self) -> SourceState;

    /// Returns a display name for logging, typically the endpoint URL.
    fn display_name(&self) -> String;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_state() {
        assert!(SourceState::Connected.is_connected());
        assert!(!SourceState::Disconnected.is_connected());
        assert!(SourceState::Connecting.is_transitioning());
        assert!(SourceState::Reconnecting.is_transitioning());
        assert!(!SourceState::Failed.is_transitioning());
    }

    #[test]
    fn test_source_state_display() {
        assert_eq!(SourceState::Reconnecting.to_string(), "Reconnecting");
        assert_eq!(SourceState::default().to_string(), "Disconnected");
    }
}
