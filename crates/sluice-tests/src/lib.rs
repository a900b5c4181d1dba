// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # sluice-tests
//!
//! Shared mocks and fixtures plus the cross-crate integration tests for the
//! SLUICE bridge. The tests under `tests/` exercise the full bridge: poller
//! against a scripted source, cache consistency under concurrency, and the
//! HTTP surface end to end.

pub mod common;

pub use common::fixtures;
pub use common::mocks::MockSource;
