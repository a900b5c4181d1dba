// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA transport abstraction.
//!
//! [`OpcUaTransport`] is the seam between the protocol-independent client
//! adapter and the actual OPC UA stack, so the client (and everything above
//! it) can be tested against an in-memory transport. The production
//! implementation is [`SessionTransport`](crate::session::SessionTransport),
//! available behind the `opcua-client` feature.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use sluice_core::source::SourceState;
use sluice_core::types::SourceValue;

use crate::error::{is_bad_status, OpcUaResult};
use crate::types::NodeId;

// =============================================================================
// ReadResult
// =============================================================================

/// Result of reading one node in a batch read.
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// The node that was read.
    pub node_id: NodeId,

    /// The value, if the read succeeded and carried one.
    pub value: Option<SourceValue>,

    /// OPC UA status code of the read (0 = Good).
    pub status: u32,

    /// Source timestamp reported by the server, if any.
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl ReadResult {
    /// Creates a successful read result.
    pub fn good(node_id: NodeId, value: SourceValue) -> Self {
        Self {
            node_id,
            value: Some(value),
            status: 0,
            source_timestamp: Some(Utc::now()),
        }
    }

    /// Creates a failed read result.
    pub fn bad(node_id: NodeId, status: u32) -> Self {
        Self {
            node_id,
            value: None,
            status,
            source_timestamp: None,
        }
    }

    /// Returns `true` if the read succeeded.
    #[inline]
    pub fn is_good(&self) -> bool {
        !is_bad_status(self.status)
    }
}

// =============================================================================
// OpcUaTransport Trait
// =============================================================================

/// Low-level OPC UA operations, as far as the bridge needs them.
///
/// The bridge is read-only, so the surface is deliberately small: connection
/// lifecycle plus batch value reads. Implementations own their connection
/// state internally and must be `Send + Sync`.
#[async_trait]
pub trait OpcUaTransport: Send + Sync {
    /// Establishes the TCP connection, secure channel, and session.
    async fn connect(&self) -> OpcUaResult<()>;

    /// Closes the session and connection. Idempotent.
    async fn disconnect(&self) -> OpcUaResult<()>;

    /// Returns `true` if a session is currently established.
    fn is_connected(&self) -> bool;

    /// Returns the current connection state.
    fn state(&self) -> SourceState;

    /// Reads the value attribute of every given node in one service call.
    ///
    /// Returns one [`ReadResult`] per requested node, in request order. A
    /// top-level `Err` means the service call itself failed.
    async fn read_values(&self, node_ids: &[NodeId]) -> OpcUaResult<Vec<ReadResult>>;

    /// Returns the server endpoint URL.
    fn endpoint(&self) -> &str;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_result_good() {
        let result = ReadResult::good(NodeId::numeric(2, 1), SourceValue::Float64(25.5));
        assert!(result.is_good());
        assert_eq!(result.value.unwrap().as_f64(), Some(25.5));
    }

    #[test]
    fn test_read_result_bad() {
        // BadNodeIdUnknown
        let result = ReadResult::bad(NodeId::numeric(2, 1), 0x8034_0000);
        assert!(!result.is_good());
        assert!(result.value.is_none());
    }
}
