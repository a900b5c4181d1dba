// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # sluice-api
//!
//! HTTP read surface of the SLUICE bridge.
//!
//! Every endpoint is a pure function of shared state — the value cache, the
//! registry, and the poller's status handle — so any number of concurrent
//! requests can be served without ever blocking the poll loop.
//!
//! ## Endpoints
//!
//! | Route                 | Purpose                                    |
//! |-----------------------|--------------------------------------------|
//! | `GET /api/values`     | Snapshot of all tags (wire format)         |
//! | `GET /api/values/{name}` | Latest record for one tag, 404 if absent |
//! | `GET /api/status`     | Poller state, cycle and failure counters   |
//! | `GET /health`         | Liveness                                   |
//! | `GET /ready`          | Readiness (poller in its polling state)    |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod server;
pub mod state;

pub use config::{ApiConfig, CorsConfig};
pub use error::{ApiError, ApiResult};
pub use response::{ApiResponse, ErrorResponse, HealthResponse, ReadinessResponse, StatusResponse};
pub use server::{ApiServer, ApiServerBuilder};
pub use state::{AppState, AppStateBuilder};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
