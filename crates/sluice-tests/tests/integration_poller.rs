// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Poller Integration Tests
//!
//! Exercises the poll loop against a scripted source: publish behavior,
//! stale-value retention on per-tag failures, the reconnect state machine,
//! and shutdown. All tests run on a paused clock, so poll intervals and
//! backoff delays elapse in virtual time.

use std::time::Duration;

use tokio::sync::watch;

use sluice_core::poller::{Poller, PollerHandle, PollerState};
use sluice_core::types::{SourceValue, TagName};
use sluice_tests::fixtures::{self, FLOW_ADDR, PRESSURE_ADDR};
use sluice_tests::MockSource;

// =============================================================================
// Test Helpers
// =============================================================================

struct RunningPoller {
    handle: PollerHandle,
    stop: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

/// Spawns a poller over the two-tag fixture registry and the given source.
fn spawn_poller(
    source: MockSource,
    cache: std::sync::Arc<sluice_core::cache::ValueCache>,
) -> RunningPoller {
    let poller = Poller::new(
        fixtures::two_tag_registry(),
        cache,
        source,
        fixtures::fast_poll_config(),
    );
    let handle = poller.handle();
    let (stop, stop_rx) = watch::channel(false);
    let task = tokio::spawn(poller.run(stop_rx));

    RunningPoller { handle, stop, task }
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn flow() -> TagName {
    TagName::new("FlowTransmitter")
}

fn pressure() -> TagName {
    TagName::new("Pressure")
}

// =============================================================================
// Publish Behavior
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_first_poll_publishes_all_tags_with_one_timestamp() {
    let source = MockSource::new();
    source.set_value(FLOW_ADDR, SourceValue::Float64(12.5));
    source.set_value(PRESSURE_ADDR, SourceValue::Float64(3.1));

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(250).await;

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[&flow()].value, 12.5);
    assert_eq!(snapshot[&flow()].unit, "L/min");
    assert_eq!(snapshot[&pressure()].value, 3.1);
    assert_eq!(snapshot[&pressure()].unit, "bar");
    // Records from one cycle share the cycle timestamp
    assert_eq!(snapshot[&flow()].timestamp, snapshot[&pressure()].timestamp);

    assert_eq!(running.handle.state(), PollerState::Polling);
    assert!(running.handle.cycles() >= 1);

    running.stop.send(true).unwrap();
    running.task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timestamps_are_monotonic_across_cycles() {
    let source = MockSource::new();
    source.set_value(FLOW_ADDR, SourceValue::Float64(1.0));
    source.set_value(PRESSURE_ADDR, SourceValue::Float64(1.0));

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(150).await;
    let first = cache.get(&flow()).unwrap();

    settle(500).await;
    let later = cache.get(&flow()).unwrap();

    assert!(later.timestamp >= first.timestamp);
    assert!(running.handle.cycles() >= 2);

    running.stop.send(true).unwrap();
    running.task.await.unwrap();
}

// =============================================================================
// Per-Tag Read Failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_read_failure_retains_stale_record() {
    let source = MockSource::new();
    source.set_value(FLOW_ADDR, SourceValue::Float64(12.5));
    source.set_value(PRESSURE_ADDR, SourceValue::Float64(3.1));

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(250).await;
    let pressure_before = cache.get(&pressure()).unwrap();

    // Pressure starts failing; Flow keeps updating with a new value.
    source.fail_address(PRESSURE_ADDR);
    source.set_value(FLOW_ADDR, SourceValue::Float64(13.0));
    settle(500).await;

    // The stale record is untouched: same value, unit, and timestamp.
    assert_eq!(cache.get(&pressure()).unwrap(), pressure_before);
    assert_eq!(cache.get(&flow()).unwrap().value, 13.0);

    // The failure was counted, and the loop stayed in Polling.
    assert!(running.handle.read_failures()[&pressure()] >= 1);
    assert_eq!(running.handle.state(), PollerState::Polling);

    running.stop.send(true).unwrap();
    running.task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_never_read_tag_is_absent_not_zero() {
    let source = MockSource::new();
    // Only the flow transmitter answers; pressure reads always fail.
    source.set_value(FLOW_ADDR, SourceValue::Float64(12.5));

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(350).await;

    let snapshot = cache.snapshot();
    assert!(snapshot.contains_key(&flow()));
    assert!(!snapshot.contains_key(&pressure()));

    running.stop.send(true).unwrap();
    running.task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_non_numeric_reading_is_treated_as_read_failure() {
    let source = MockSource::new();
    source.set_value(FLOW_ADDR, SourceValue::Null);
    source.set_value(PRESSURE_ADDR, SourceValue::Float64(3.1));

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(250).await;

    assert!(cache.get(&flow()).is_none());
    assert!(cache.get(&pressure()).is_some());
    assert!(running.handle.read_failures()[&flow()] >= 1);

    running.stop.send(true).unwrap();
    running.task.await.unwrap();
}

// =============================================================================
// Connection Loss & Reconnect
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_connection_loss_triggers_reconnect_and_keeps_snapshot() {
    let source = MockSource::new();
    source.set_value(FLOW_ADDR, SourceValue::Float64(12.5));
    source.set_value(PRESSURE_ADDR, SourceValue::Float64(3.1));

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(250).await;
    let snapshot_before = cache.snapshot();
    assert_eq!(snapshot_before.len(), 2);
    let closes_before = source.close_count();

    // The link goes down: reads report connection loss, reconnects fail.
    source.drop_connection();
    settle(300).await;

    assert!(matches!(
        running.handle.state(),
        PollerState::Reconnecting | PollerState::Connecting
    ));
    assert!(running.handle.reconnects() >= 1);
    // The client was closed before reconnecting
    assert!(source.close_count() > closes_before);
    // The last good snapshot is still served unchanged
    assert_eq!(cache.snapshot(), snapshot_before);

    // The link comes back with a new flow value.
    source.set_value(FLOW_ADDR, SourceValue::Float64(20.0));
    source.restore_connection();
    settle(1_000).await;

    assert_eq!(running.handle.state(), PollerState::Polling);
    assert_eq!(cache.get(&flow()).unwrap().value, 20.0);

    running.stop.send(true).unwrap();
    running.task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_initial_connect_failure_backs_off_and_recovers() {
    let source = MockSource::new();
    source.set_value(FLOW_ADDR, SourceValue::Float64(1.0));
    source.set_value(PRESSURE_ADDR, SourceValue::Float64(2.0));
    source.drop_connection();

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(300).await;
    assert!(source.connect_count() >= 2);
    assert!(cache.is_empty());

    source.restore_connection();
    settle(1_000).await;

    assert_eq!(running.handle.state(), PollerState::Polling);
    assert_eq!(cache.len(), 2);

    running.stop.send(true).unwrap();
    running.task.await.unwrap();
}

// =============================================================================
// Shutdown & Empty Registry
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_loop_and_closes_client() {
    let source = MockSource::new();
    source.set_value(FLOW_ADDR, SourceValue::Float64(1.0));
    source.set_value(PRESSURE_ADDR, SourceValue::Float64(2.0));

    let cache = fixtures::fresh_cache();
    let running = spawn_poller(source.clone(), cache.clone());

    settle(250).await;

    running.stop.send(true).unwrap();
    running.task.await.unwrap();

    assert_eq!(running.handle.state(), PollerState::Stopped);
    assert!(source.close_count() >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_registry_idles_without_reads() {
    let source = MockSource::new();
    let cache = fixtures::fresh_cache();

    let poller = Poller::new(
        fixtures::empty_registry(),
        cache.clone(),
        source.clone(),
        fixtures::fast_poll_config(),
    );
    let handle = poller.handle();
    let (stop, stop_rx) = watch::channel(false);
    let task = tokio::spawn(poller.run(stop_rx));

    settle(500).await;

    assert_eq!(handle.state(), PollerState::Polling);
    assert_eq!(source.read_count(), 0);
    assert!(cache.is_empty());

    stop.send(true).unwrap();
    task.await.unwrap();
}
