// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use sluice_core::cache::ValueCache;
use sluice_core::poller::PollerHandle;
use sluice_core::registry::TagRegistry;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// AppState
// =============================================================================

/// State container handed to every handler via axum's state extraction.
///
/// The cache reference is the read side of the bridge: handlers only ever
/// call `snapshot`/`get` on it, never anything that could block on the
/// source.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,

    /// The shared value cache (read side).
    pub cache: Arc<ValueCache>,

    /// The tag registry.
    pub registry: Arc<TagRegistry>,

    /// Poller status handle.
    pub poller: PollerHandle,

    /// Process start time, for the status endpoint.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates a new state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for [`AppState`].
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    cache: Option<Arc<ValueCache>>,
    registry: Option<Arc<TagRegistry>>,
    poller: Option<PollerHandle>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            cache: None,
            registry: None,
            poller: None,
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the value cache.
    pub fn cache(mut self, cache: Arc<ValueCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the tag registry.
    pub fn registry(mut self, registry: Arc<TagRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the poller status handle.
    pub fn poller(mut self, poller: PollerHandle) -> Self {
        self.poller = Some(poller);
        self
    }

    /// Builds the state.
    ///
    /// # Errors
    ///
    /// Fails if the cache was not provided; everything else has a default.
    pub fn build(self) -> ApiResult<AppState> {
        let cache = self
            .cache
            .ok_or_else(|| ApiError::internal("AppState requires a value cache"))?;

        Ok(AppState {
            config: Arc::new(self.config.unwrap_or_default()),
            cache,
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(TagRegistry::empty())),
            poller: self.poller.unwrap_or_default(),
            started_at: Utc::now(),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_cache() {
        assert!(AppState::builder().build().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let state = AppState::builder()
            .cache(Arc::new(ValueCache::new()))
            .build()
            .unwrap();

        assert!(state.registry.is_empty());
        assert_eq!(state.config.port, 5000);
    }
}
