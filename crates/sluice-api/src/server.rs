// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::time::Duration;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::handlers;
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The HTTP server serving the snapshot and operational endpoints.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Creates a server over the given state.
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Creates a server builder.
    pub fn builder() -> ApiServerBuilder {
        ApiServerBuilder::new()
    }

    /// Builds the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let config = &self.state.config;

        let middleware = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(config.request_timeout))
            .option_layer(cors_layer(config));

        Router::new()
            // Snapshot surface
            .route("/api/values", get(handlers::get_values))
            .route("/api/values/{name}", get(handlers::get_value))
            // Operational surface
            .route("/api/status", get(handlers::status))
            .route("/health", get(handlers::health))
            .route("/ready", get(handlers::ready))
            .layer(middleware)
            .with_state(self.state.clone())
    }

    /// Runs the server until the listener fails.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    ///
    /// In-flight requests are drained after `shutdown_signal` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.state.config.socket_addr()?;
        let router = self.router();

        info!("Starting API server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::error::ApiError::internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| crate::error::ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Builds the CORS layer from configuration, or `None` when disabled.
fn cors_layer(config: &ApiConfig) -> Option<CorsLayer> {
    if !config.cors.enabled {
        return None;
    }

    let mut layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .max_age(Duration::from_secs(3600));

    if config.cors.allows_any_origin() {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .cors
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins);
    }

    Some(layer)
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for [`ApiServer`].
pub struct ApiServerBuilder {
    state_builder: crate::state::AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            state_builder: AppState::builder(),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the value cache.
    pub fn cache(mut self, cache: std::sync::Arc<sluice_core::cache::ValueCache>) -> Self {
        self.state_builder = self.state_builder.cache(cache);
        self
    }

    /// Sets the tag registry.
    pub fn registry(mut self, registry: std::sync::Arc<sluice_core::registry::TagRegistry>) -> Self {
        self.state_builder = self.state_builder.registry(registry);
        self
    }

    /// Sets the poller status handle.
    pub fn poller(mut self, poller: sluice_core::poller::PollerHandle) -> Self {
        self.state_builder = self.state_builder.poller(poller);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

impl Default for ApiServerBuilder {
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
    use crate::config::CorsConfig;
    use std::sync::Arc;

    use sluice_core::cache::ValueCache;

    #[test]
    fn test_server_builder() {
        let server = ApiServer::builder()
            .cache(Arc::new(ValueCache::new()))
            .build()
            .unwrap();

        let _router = server.router();
    }

    #[test]
    fn test_builder_requires_cache() {
        assert!(ApiServer::builder().build().is_err());
    }

    #[test]
    fn test_cors_layer_disabled() {
        let config = ApiConfig {
            cors: CorsConfig {
                enabled: false,
                allowed_origins: vec![],
            },
            ..ApiConfig::default()
        };
        assert!(cors_layer(&config).is_none());
    }

    #[test]
    fn test_cors_layer_restricted_origins() {
        let config = ApiConfig {
            cors: CorsConfig {
                enabled: true,
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            ..ApiConfig::default()
        };
        assert!(cors_layer(&config).is_some());
    }
}
