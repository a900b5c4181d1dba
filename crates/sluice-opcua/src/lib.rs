// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # sluice-opcua
//!
//! OPC UA source client for the SLUICE bridge.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              Poller (sluice-core)            │
//! └──────────────────────────────────────────────┘
//!                      │  SourceClient
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │                OpcUaClient<T>                │
//! │   (address parsing, timeouts, error split)   │
//! └──────────────────────────────────────────────┘
//!                      │  OpcUaTransport
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │  SessionTransport (`opcua-client` feature)   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The client owns the one policy decision this protocol layer has to make:
//! which OPC UA failures mean "reconnect" and which mean "this one tag is
//! bad" (see [`error`]).

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(feature = "opcua-client")]
pub mod session;

pub use client::OpcUaClient;
pub use error::{OpcUaError, OpcUaResult};
pub use transport::{OpcUaTransport, ReadResult};
pub use types::{NodeId, NodeIdentifier, OpcUaConfig, SecurityMode, SecurityPolicy};

#[cfg(feature = "opcua-client")]
pub use session::SessionTransport;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
