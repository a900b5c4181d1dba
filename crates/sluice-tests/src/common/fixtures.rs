// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Builders for the registries and poll configurations the integration tests
//! use. The canonical fixture mirrors a small plant skid: a flow transmitter
//! and a pressure transmitter.

use std::sync::Arc;
use std::time::Duration;

use sluice_core::cache::ValueCache;
use sluice_core::poller::{BackoffConfig, PollConfig};
use sluice_core::registry::{TagRegistry, TagSpec};

/// Node address of the flow transmitter fixture tag.
pub const FLOW_ADDR: &str = "ns=2;s=Flow.PV";

/// Node address of the pressure transmitter fixture tag.
pub const PRESSURE_ADDR: &str = "ns=2;s=Press.PV";

/// Builds the two-tag fixture registry.
pub fn two_tag_registry() -> Arc<TagRegistry> {
    Arc::new(
        TagRegistry::from_entries([
            TagSpec::new("FlowTransmitter", FLOW_ADDR).with_unit("L/min"),
            TagSpec::new("Pressure", PRESSURE_ADDR).with_unit("bar"),
        ])
        .expect("fixture registry is valid"),
    )
}

/// Builds an empty registry.
pub fn empty_registry() -> Arc<TagRegistry> {
    Arc::new(TagRegistry::empty())
}

/// Builds a fresh cache.
pub fn fresh_cache() -> Arc<ValueCache> {
    Arc::new(ValueCache::new())
}

/// Poll configuration with short, test-friendly timings.
pub fn fast_poll_config() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(100),
        backoff: BackoffConfig {
            initial_delay: Duration::from_millis(50),
            multiplier: 2.0,
            max_delay: Duration::from_millis(400),
        },
    }
}
