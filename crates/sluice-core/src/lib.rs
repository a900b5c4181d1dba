// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # sluice-core
//!
//! Core abstractions for SLUICE, the OPC UA to HTTP process-value bridge.
//!
//! This crate holds everything the bridge needs that is independent of the
//! wire protocols on either side:
//!
//! - **Types**: `TagName`, `SourceValue`, `ValueRecord`
//! - **Registry**: the immutable tag table loaded at startup
//! - **Cache**: the single-writer / many-reader latest-value store
//! - **Source**: the client abstraction the poller reads through
//! - **Poller**: the fixed-period read loop with reconnect backoff
//! - **Error**: registry and source error taxonomy
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sluice_core::cache::ValueCache;
//! use sluice_core::poller::{PollConfig, Poller};
//! use sluice_core::registry::{TagRegistry, TagSpec};
//!
//! let registry = Arc::new(TagRegistry::from_entries([
//!     TagSpec::new("FlowTransmitter", "ns=2;s=Flow.PV").with_unit("L/min"),
//! ])?);
//! let cache = Arc::new(ValueCache::new());
//!
//! let poller = Poller::new(registry, cache.clone(), client, PollConfig::default());
//! let status = poller.handle();
//! tokio::spawn(poller.run(shutdown_rx));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cache;
pub mod error;
pub mod poller;
pub mod registry;
pub mod source;
pub mod types;

pub use cache::{CacheStats, ValueCache};
pub use error::{RegistryError, SourceError, SourceResult};
pub use poller::{BackoffConfig, PollConfig, Poller, PollerHandle, PollerState, ReconnectBackoff};
pub use registry::{TagRegistry, TagSpec};
pub use source::{AddressRead, SourceClient, SourceState};
pub use types::{SourceValue, TagName, ValueRecord};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
