// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations
//!
//! Scriptable source client for testing the poller and the bridge without a
//! live OPC UA server.
//!
//! ## Design Principles
//!
//! - Configurable behavior for different failure scenarios
//! - Recording of interactions for verification
//! - Cloneable handle so tests can keep scripting after the poller takes
//!   ownership

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use sluice_core::error::{SourceError, SourceResult};
use sluice_core::source::{AddressRead, SourceClient, SourceState};
use sluice_core::types::SourceValue;

// =============================================================================
// MockSource
// =============================================================================

/// A scriptable in-memory source client.
///
/// Cloning returns a handle to the same underlying state, so a test can hand
/// one clone to the poller and keep another to inject values and failures.
#[derive(Clone, Default)]
pub struct MockSource {
    inner: Arc<MockSourceInner>,
}

#[derive(Default)]
struct MockSourceInner {
    /// Values keyed by address.
    values: RwLock<HashMap<String, SourceValue>>,

    /// Addresses whose reads fail individually.
    failing_addresses: RwLock<HashSet<String>>,

    /// Connection state.
    connected: AtomicBool,

    /// When set, `connect` fails and `read_values` reports connection loss.
    connection_down: AtomicBool,

    /// Interaction counters.
    connect_count: AtomicU64,
    read_count: AtomicU64,
    close_count: AtomicU64,
}

impl MockSource {
    /// Creates a mock with no values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value read for an address.
    pub fn set_value(&self, address: &str, value: SourceValue) {
        self.inner
            .values
            .write()
            .insert(address.to_string(), value);
    }

    /// Makes reads of one address fail (session stays healthy).
    pub fn fail_address(&self, address: &str) {
        self.inner
            .failing_addresses
            .write()
            .insert(address.to_string());
    }

    /// Clears a per-address failure.
    pub fn restore_address(&self, address: &str) {
        self.inner.failing_addresses.write().remove(address);
    }

    /// Simulates losing the connection: reads report connection loss and
    /// reconnect attempts fail until [`restore_connection`](Self::restore_connection).
    pub fn drop_connection(&self) {
        self.inner.connection_down.store(true, Ordering::SeqCst);
        self.inner.connected.store(false, Ordering::SeqCst);
    }

    /// Lets the next connect attempt succeed again.
    pub fn restore_connection(&self) {
        self.inner.connection_down.store(false, Ordering::SeqCst);
    }

    /// Number of connect calls.
    pub fn connect_count(&self) -> u64 {
        self.inner.connect_count.load(Ordering::SeqCst)
    }

    /// Number of batch read calls.
    pub fn read_count(&self) -> u64 {
        self.inner.read_count.load(Ordering::SeqCst)
    }

    /// Number of close calls.
    pub fn close_count(&self) -> u64 {
        self.inner.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for MockSource {
    async fn connect(&self) -> SourceResult<()> {
        self.inner.connect_count.fetch_add(1, Ordering::SeqCst);

        if self.inner.connection_down.load(Ordering::SeqCst) {
            return Err(SourceError::connection("mock source is down"));
        }

        self.inner.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn read_values(&self, addresses: &[String]) -> SourceResult<Vec<AddressRead>> {
        self.inner.read_count.fetch_add(1, Ordering::SeqCst);

        if self.inner.connection_down.load(Ordering::SeqCst) {
            return Err(SourceError::connection("mock source is down"));
        }
        if !self.inner.connected.load(Ordering::SeqCst) {
            return Err(SourceError::NotConnected);
        }

        let values = self.inner.values.read();
        let failing = self.inner.failing_addresses.read();

        Ok(addresses
            .iter()
            .map(|address| {
                let outcome = if failing.contains(address) {
                    Err(SourceError::read_failed(address, "injected failure"))
                } else {
                    match values.get(address) {
                        Some(value) => Ok(value.clone()),
                        None => Err(SourceError::read_failed(address, "no such address")),
                    }
                };
                (address.clone(), outcome)
            })
            .collect())
    }

    async fn close(&self) -> SourceResult<()> {
        self.inner.close_count.fetch_add(1, Ordering::SeqCst);
        self.inner.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn state(&self) -> SourceState {
        if self.inner.connected.load(Ordering::SeqCst) {
            SourceState::Connected
        } else {
            SourceState::Disconnected
        }
    }

    fn display_name(&self) -> String {
        "mock://source".to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
