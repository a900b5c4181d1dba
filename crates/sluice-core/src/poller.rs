// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The poll loop: reads registered tags from the source on a fixed period
//! and publishes the results into the value cache.
//!
//! # State machine
//!
//! ```text
//! Disconnected → Connecting → Polling ──────────────┐
//!                    ▲                              │ connection loss
//!                    │        backoff               ▼
//!                    └────── Reconnecting ◄─────────┘
//!
//! any state → Stopped on shutdown signal
//! ```
//!
//! The poller is one logical loop: a poll cycle that outlives its period
//! simply delays the next tick, so cache writes are never contended and
//! cycles never overlap. Per-address read failures leave the previous cached
//! record untouched; only session-level failures tear the connection down.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::ValueCache;
use crate::registry::TagRegistry;
use crate::source::SourceClient;
use crate::types::{TagName, ValueRecord};

// =============================================================================
// PollerState
// =============================================================================

/// Lifecycle state of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PollerState {
    /// Loop has not started yet.
    #[default]
    Disconnected,

    /// Establishing the source connection.
    Connecting,

    /// Connected; reading tags on the poll period.
    Polling,

    /// Connection lost; backing off before the next connect attempt.
    Reconnecting,

    /// Loop has exited after a shutdown signal.
    Stopped,
}

impl std::fmt::Display for PollerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Polling => write!(f, "Polling"),
            Self::Reconnecting => write!(f, "Reconnecting"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

// =============================================================================
// Backoff
// =============================================================================

/// Configuration for the reconnect backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt.
    pub initial_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,

    /// Upper bound on the delay.
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Exponential backoff for reconnect attempts.
///
/// Reset on every successful connect so a flapping link starts over from the
/// initial delay.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ReconnectBackoff {
    /// Creates a backoff in its initial state.
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Returns the delay for the next attempt and advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let factor = self.config.multiplier.powi(self.attempt as i32);
        let delay = self.config.initial_delay.mul_f64(factor.max(1.0));
        self.attempt = self.attempt.saturating_add(1);
        delay.min(self.config.max_delay)
    }

    /// Resets the sequence after a successful connect.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Number of consecutive failed attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

// =============================================================================
// PollConfig
// =============================================================================

/// Timing configuration for the poll loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Fixed period between poll cycles.
    pub interval: Duration,

    /// Reconnect backoff policy.
    pub backoff: BackoffConfig,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff: BackoffConfig::default(),
        }
    }
}

// =============================================================================
// PollerHandle
// =============================================================================

/// Shared view of the poller, for status reporting.
///
/// Cloneable and cheap; the HTTP status handler holds one.
#[derive(Debug, Clone, Default)]
pub struct PollerHandle {
    inner: Arc<PollerShared>,
}

#[derive(Debug, Default)]
struct PollerShared {
    state: RwLock<PollerState>,
    cycles: AtomicU64,
    reconnects: AtomicU64,
    last_cycle_at: RwLock<Option<DateTime<Utc>>>,
    read_failures: RwLock<BTreeMap<TagName, u64>>,
}

impl PollerHandle {
    /// Returns the current loop state.
    pub fn state(&self) -> PollerState {
        *self.inner.state.read()
    }

    /// Number of completed poll cycles.
    pub fn cycles(&self) -> u64 {
        self.inner.cycles.load(Ordering::Relaxed)
    }

    /// Number of reconnect transitions.
    pub fn reconnects(&self) -> u64 {
        self.inner.reconnects.load(Ordering::Relaxed)
    }

    /// Completion time of the most recent poll cycle.
    pub fn last_cycle_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_cycle_at.read()
    }

    /// Per-tag read failure counters.
    pub fn read_failures(&self) -> BTreeMap<TagName, u64> {
        self.inner.read_failures.read().clone()
    }

    fn set_state(&self, state: PollerState) {
        *self.inner.state.write() = state;
    }

    fn record_cycle(&self, at: DateTime<Utc>) {
        self.inner.cycles.fetch_add(1, Ordering::Relaxed);
        *self.inner.last_cycle_at.write() = Some(at);
    }

    fn record_reconnect(&self) {
        self.inner.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    fn record_read_failure(&self, name: &TagName) {
        let mut failures = self.inner.read_failures.write();
        *failures.entry(name.clone()).or_insert(0) += 1;
    }
}

// =============================================================================
// Poller
// =============================================================================

/// Drives the poll loop against one source client.
///
/// Exactly one poller writes a given [`ValueCache`].
pub struct Poller<S: SourceClient> {
    registry: Arc<TagRegistry>,
    cache: Arc<ValueCache>,
    client: S,
    config: PollConfig,
    handle: PollerHandle,
}

impl<S: SourceClient> Poller<S> {
    /// Creates a poller over the given registry, cache, and client.
    pub fn new(
        registry: Arc<TagRegistry>,
        cache: Arc<ValueCache>,
        client: S,
        config: PollConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            client,
            config,
            handle: PollerHandle::default(),
        }
    }

    /// Returns a shared handle for status reporting.
    pub fn handle(&self) -> PollerHandle {
        self.handle.clone()
    }

    /// Runs the loop until `shutdown` flips to `true` (or its sender drops).
    ///
    /// The in-flight read is bounded by the client's own timeout, so shutdown
    /// latency is at most one read timeout plus one poll period.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let addresses = self.registry.addresses();
        let mut backoff = ReconnectBackoff::new(self.config.backoff.clone());

        info!(
            tags = addresses.len(),
            interval_ms = self.config.interval.as_millis() as u64,
            source = %self.client.display_name(),
            "Poller starting"
        );

        'reconnect: loop {
            if is_shutdown(&shutdown) {
                break;
            }

            // Connect phase
            self.handle.set_state(PollerState::Connecting);
            match self.client.connect().await {
                Ok(()) => {
                    info!(source = %self.client.display_name(), "Source connected");
                    backoff.reset();
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(
                        error = %e,
                        attempt = backoff.attempts(),
                        retry_in_ms = delay.as_millis() as u64,
                        "Source connect failed"
                    );
                    self.handle.set_state(PollerState::Reconnecting);
                    self.handle.record_reconnect();
                    if sleep_or_shutdown(&mut shutdown, delay).await {
                        break 'reconnect;
                    }
                    continue 'reconnect;
                }
            }

            // Polling phase
            self.handle.set_state(PollerState::Polling);
            let mut ticker = tokio::time::interval(self.config.interval);
            // A cycle that overruns its period defers the next tick instead
            // of stacking overlapping polls.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break 'reconnect;
                        }
                        continue;
                    }
                }

                if addresses.is_empty() {
                    // Nothing to read; stay connected and idle.
                    continue;
                }

                match self.client.read_values(&addresses).await {
                    Ok(results) => {
                        self.publish_cycle(results);
                    }
                    Err(e) if e.is_connection_loss() => {
                        warn!(error = %e, "Source connection lost, reconnecting");
                        self.handle.set_state(PollerState::Reconnecting);
                        self.handle.record_reconnect();

                        if let Err(close_err) = self.client.close().await {
                            debug!(error = %close_err, "Error closing source client");
                        }

                        let delay = backoff.next_delay();
                        if sleep_or_shutdown(&mut shutdown, delay).await {
                            break 'reconnect;
                        }
                        continue 'reconnect;
                    }
                    Err(e) => {
                        // Session survived but the cycle produced nothing;
                        // every tag keeps its stale value.
                        warn!(error = %e, "Poll cycle failed");
                    }
                }
            }
        }

        if let Err(e) = self.client.close().await {
            debug!(error = %e, "Error closing source client on shutdown");
        }
        self.handle.set_state(PollerState::Stopped);
        info!("Poller stopped");
    }

    /// Publishes one cycle's results into the cache.
    ///
    /// All records of a cycle share a single wall-clock timestamp, taken
    /// after the read completed.
    fn publish_cycle(&self, results: Vec<crate::source::AddressRead>) {
        let cycle_ts = Utc::now();
        let mut published = 0usize;
        let mut failed = 0usize;

        for (address, outcome) in results {
            let Some(spec) = self.registry.get_by_address(&address) else {
                debug!(address = %address, "Read result for unregistered address");
                continue;
            };

            match outcome {
                Ok(raw) => match raw.as_f64() {
                    Some(value) => {
                        let value = spec.apply_hints(value);
                        self.cache.publish(
                            spec.name.clone(),
                            ValueRecord::new(value, spec.unit.clone(), cycle_ts),
                        );
                        published += 1;
                    }
                    None => {
                        // Non-numeric reading; keep the stale record.
                        self.handle.record_read_failure(&spec.name);
                        debug!(tag = %spec.name, kind = raw.type_name(), "Discarded non-numeric reading");
                        failed += 1;
                    }
                },
                Err(e) => {
                    self.handle.record_read_failure(&spec.name);
                    debug!(tag = %spec.name, error = %e, "Tag read failed, retaining previous value");
                    failed += 1;
                }
            }
        }

        self.handle.record_cycle(cycle_ts);
        debug!(published, failed, "Poll cycle complete");
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow()
}

/// Sleeps for `delay`, returning `true` if shutdown was signaled first.
async fn sleep_or_shutdown(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let mut backoff = ReconnectBackoff::new(BackoffConfig {
            initial_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: Duration::from_millis(500),
        });

        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        // Capped
        assert_eq!(backoff.next_delay(), Duration::from_millis(500));
        assert_eq!(backoff.attempts(), 4);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_multiplier_below_one_is_clamped() {
        let mut backoff = ReconnectBackoff::new(BackoffConfig {
            initial_delay: Duration::from_millis(100),
            multiplier: 0.5,
            max_delay: Duration::from_secs(1),
        });

        // A sub-unit multiplier must never shrink the delay below initial.
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_poller_handle_counters() {
        let handle = PollerHandle::default();
        assert_eq!(handle.state(), PollerState::Disconnected);
        assert_eq!(handle.cycles(), 0);

        handle.set_state(PollerState::Polling);
        handle.record_cycle(Utc::now());
        handle.record_read_failure(&TagName::new("Flow"));
        handle.record_read_failure(&TagName::new("Flow"));

        assert_eq!(handle.state(), PollerState::Polling);
        assert_eq!(handle.cycles(), 1);
        assert!(handle.last_cycle_at().is_some());
        assert_eq!(handle.read_failures()[&TagName::new("Flow")], 2);
    }

    #[test]
    fn test_poller_state_display() {
        assert_eq!(PollerState::Polling.to_string(), "Polling");
        assert_eq!(PollerState::Stopped.to_string(), "Stopped");
    }
}
