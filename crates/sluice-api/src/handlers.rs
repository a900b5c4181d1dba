// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request handlers.
//!
//! The snapshot handlers are pure functions of the cache: take a point-in-time
//! copy, encode, respond. They never touch the source connection, so a hung
//! PLC can slow down polling but never an HTTP response.

use axum::{
    extract::{Path, State},
    Json,
};

use sluice_core::types::{TagName, ValueRecord};

use crate::error::{ApiError, ApiResult};
use crate::response::{
    ApiResponse, ComponentStatus, HealthResponse, ReadinessResponse, StatusResponse,
};
use crate::state::AppState;

// =============================================================================
// Snapshot Endpoints
// =============================================================================

/// `GET /api/values`
///
/// Returns the latest reading of every tag as a flat JSON object keyed by
/// tag name. Tags with no successful read yet are omitted; an empty cache
/// yields `{}` with `200`.
pub async fn get_values(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let snapshot = state.cache.snapshot();

    let body = serde_json::to_value(&snapshot)
        .map_err(|e| ApiError::internal(format!("failed to encode snapshot: {}", e)))?;

    Ok(Json(body))
}

/// `GET /api/values/{name}`
///
/// Returns the latest reading of a single tag, or `404` if the tag has never
/// been read (or does not exist).
pub async fn get_value(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Json<ValueRecord>> {
    state
        .cache
        .get(&TagName::new(name.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("tag '{}'", name)))
}

// =============================================================================
// Operational Endpoints
// =============================================================================

/// `GET /health`
///
/// Liveness probe; answers as long as the process runs.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// `GET /ready`
///
/// Readiness probe: the bridge is ready once the poller is in its polling
/// state. Consumers can still read stale snapshots while not ready.
pub async fn ready(State(state): State<AppState>) -> Json<ReadinessResponse> {
    let poller_state = state.poller.state();
    let polling = poller_state == sluice_core::poller::PollerState::Polling;

    let components = vec![
        ComponentStatus::new("poller", polling).with_message(poller_state.to_string()),
        ComponentStatus::new("cache", true)
            .with_message(format!("{} tags published", state.cache.len())),
    ];

    Json(ReadinessResponse {
        ready: polling,
        components,
    })
}

/// `GET /api/status`
///
/// Bridge diagnostics: poller state, cycle counters, per-tag read failures.
pub async fn status(State(state): State<AppState>) -> Json<ApiResponse<StatusResponse>> {
    let read_failures = state
        .poller
        .read_failures()
        .into_iter()
        .map(|(name, count)| (name.into_inner(), count))
        .collect();

    let status = StatusResponse {
        poller_state: state.poller.state(),
        cycles: state.poller.cycles(),
        reconnects: state.poller.reconnects(),
        last_cycle_at: state.poller.last_cycle_at(),
        tags_configured: state.registry.len(),
        tags_published: state.cache.len(),
        read_failures,
        started_at: state.started_at,
    };

    Json(ApiResponse::success(status))
}

// =============================================================================
// Tests
// =============================================================================
