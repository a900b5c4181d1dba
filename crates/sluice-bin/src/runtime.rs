// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bridge runtime orchestration.
//!
//! Wires the components together in dependency order:
//!
//! 1. Tag registry from configuration (fatal if invalid)
//! 2. Value cache
//! 3. OPC UA client and poller task (sole cache writer)
//! 4. API server with graceful shutdown (cache readers)
//!
//! On shutdown the poller is stopped first (its in-flight read is bounded by
//! the configured read timeout), then the HTTP server drains in-flight
//! requests.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use sluice_api::{ApiConfig, ApiServer, CorsConfig};
use sluice_config::{load_config, SluiceConfig};
use sluice_core::cache::ValueCache;
use sluice_core::poller::PollerHandle;
use sluice_core::registry::TagRegistry;

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// BridgeRuntime
// =============================================================================

/// The main runtime that owns every component of the bridge.
pub struct BridgeRuntime {
    config: Arc<SluiceConfig>,
    shutdown: ShutdownCoordinator,
}

impl BridgeRuntime {
    /// Creates a runtime from a validated configuration.
    pub fn new(config: SluiceConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the shutdown coordinator, e.g. to trigger shutdown from tests.
    pub fn shutdown_coordinator(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Runs the bridge until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(
            gateway = %self.config.gateway.id,
            "Starting SLUICE Bridge v{}",
            sluice_core::VERSION
        );

        let registry = Arc::new(TagRegistry::from_entries(self.config.tag_specs())?);
        let cache = Arc::new(ValueCache::new());

        // Poller: the sole cache writer.
        let (stop_tx, stop_rx) = watch::channel(false);
        let (poller_handle, poller_task) =
            self.spawn_poller(registry.clone(), cache.clone(), stop_rx)?;

        // Forward the shutdown broadcast into the poller's stop channel.
        {
            let mut shutdown_rx = self.shutdown.subscribe();
            let stop_tx = stop_tx.clone();
            tokio::spawn(async move {
                let _ = shutdown_rx.recv().await;
                let _ = stop_tx.send(true);
            });
        }

        // API server: any number of cache readers.
        let server = ApiServer::builder()
            .config(api_config_from(&self.config))
            .cache(cache)
            .registry(registry)
            .poller(poller_handle)
            .build()?;

        let signal = self.shutdown.shutdown_signal();
        let mut server_task = tokio::spawn(server.run_with_shutdown(signal.wait()));

        info!(
            "SLUICE Bridge is ready (API: {}:{})",
            self.config.http.bind_address, self.config.http.port
        );

        tokio::select! {
            _ = self.shutdown.wait_for_shutdown() => {}
            result = &mut server_task => {
                // The server died on its own (e.g. bind failure). Stop the
                // poller and surface the error.
                self.shutdown.initiate_shutdown();
                let _ = stop_tx.send(true);
                let _ = poller_task.await;
                return match result {
                    Ok(server_result) => server_result.map_err(BinError::from),
                    Err(e) => Err(BinError::Runtime(format!("API server task failed: {}", e))),
                };
            }
        }

        info!("Shutdown initiated, stopping poller and draining requests");

        let _ = stop_tx.send(true);
        if let Err(e) = poller_task.await {
            warn!(error = %e, "Poller task ended abnormally");
        }

        match server_task.await {
            Ok(server_result) => server_result?,
            Err(e) => warn!(error = %e, "API server task ended abnormally"),
        }

        info!("SLUICE Bridge shutdown complete");
        Ok(())
    }

    /// Builds the OPC UA client and starts the poll loop.
    #[cfg(feature = "opcua-client")]
    fn spawn_poller(
        &self,
        registry: Arc<TagRegistry>,
        cache: Arc<ValueCache>,
        stop_rx: watch::Receiver<bool>,
    ) -> BinResult<(PollerHandle, JoinHandle<()>)> {
        use sluice_core::poller::Poller;
        use sluice_opcua::{OpcUaClient, SessionTransport};

        let source_config = opcua_config_from(&self.config)?;
        let transport = SessionTransport::new(source_config.clone());
        let client = OpcUaClient::new(source_config, transport);

        let poller = Poller::new(registry, cache, client, self.config.poll_config());
        let handle = poller.handle();
        let task = tokio::spawn(poller.run(stop_rx));

        Ok((handle, task))
    }

    #[cfg(not(feature = "opcua-client"))]
    fn spawn_poller(
        &self,
        _registry: Arc<TagRegistry>,
        _cache: Arc<ValueCache>,
        _stop_rx: watch::Receiver<bool>,
    ) -> BinResult<(PollerHandle, JoinHandle<()>)> {
        Err(BinError::Initialization(
            "this build has no OPC UA client (rebuild with the `opcua-client` feature)".to_string(),
        ))
    }
}

// =============================================================================
// Config Mapping
// =============================================================================

/// Maps the configuration's HTTP section into the API server configuration.
pub fn api_config_from(config: &SluiceConfig) -> ApiConfig {
    ApiConfig {
        bind_address: config.http.bind_address.clone(),
        port: config.http.port,
        request_timeout: config.http.request_timeout(),
        cors: CorsConfig {
            enabled: config.http.cors_enabled,
            allowed_origins: config.http.allowed_origins.clone(),
        },
    }
}

/// Maps the configuration's source section into the OPC UA client
/// configuration.
pub fn opcua_config_from(config: &SluiceConfig) -> BinResult<sluice_opcua::OpcUaConfig> {
    use sluice_config::{SecurityMode as CfgMode, SecurityPolicy as CfgPolicy};
    use sluice_opcua::{SecurityMode, SecurityPolicy};

    let source = &config.source;

    let mut builder = sluice_opcua::OpcUaConfig::builder()
        .endpoint(source.endpoint.as_str())
        .application_name(source.application_name.as_str())
        .application_uri(source.application_uri.as_str())
        .security_policy(match source.security_policy {
            CfgPolicy::None => SecurityPolicy::None,
            CfgPolicy::Basic128Rsa15 => SecurityPolicy::Basic128Rsa15,
            CfgPolicy::Basic256 => SecurityPolicy::Basic256,
            CfgPolicy::Basic256Sha256 => SecurityPolicy::Basic256Sha256,
            CfgPolicy::Aes128Sha256RsaOaep => SecurityPolicy::Aes128Sha256RsaOaep,
            CfgPolicy::Aes256Sha256RsaPss => SecurityPolicy::Aes256Sha256RsaPss,
        })
        .security_mode(match source.security_mode {
            CfgMode::None => SecurityMode::None,
            CfgMode::Sign => SecurityMode::Sign,
            CfgMode::SignAndEncrypt => SecurityMode::SignAndEncrypt,
        })
        .trust_server_certs(source.trust_server_certs)
        .connect_timeout(source.connect_timeout())
        .request_timeout(source.request_timeout());

    if let (Some(username), Some(password)) = (&source.username, &source.password) {
        builder = builder.username(username.as_str(), password.as_str());
    }

    builder
        .build()
        .map_err(|e| BinError::Configuration(e.to_string()))
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`BridgeRuntime`].
pub struct RuntimeBuilder {
    config_path: Option<std::path::PathBuf>,
    config: Option<SluiceConfig>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: None,
        }
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: SluiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the runtime, loading the configuration file if needed.
    pub fn build(self) -> BinResult<BridgeRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let path = self.config_path.ok_or_else(|| {
                    BinError::Configuration("No configuration provided".to_string())
                })?;

                load_config(&path).map_err(|e| {
                    BinError::Configuration(format!(
                        "Failed to load config from {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        };

        Ok(BridgeRuntime::new(config))
    }
}

impl Default for RuntimeBuilder {
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
    use sluice_config::{SourceConfig, TagEntry};

    fn test_config() -> SluiceConfig {
        SluiceConfig {
            source: SourceConfig {
                endpoint: "opc.tcp://localhost:4840".to_string(),
                ..SourceConfig::default()
            },
            tags: vec![TagEntry {
                name: "Flow".to_string(),
                address: "ns=2;i=1".to_string(),
                unit: "L/min".to_string(),
                scale: None,
                decimals: None,
            }],
            ..SluiceConfig::default()
        }
    }

    #[test]
    fn test_runtime_builder_with_config() {
        let runtime = RuntimeBuilder::new().config(test_config()).build().unwrap();
        assert!(!runtime.shutdown_coordinator().is_shutdown_initiated());
    }

    #[test]
    fn test_runtime_builder_requires_config() {
        assert!(RuntimeBuilder::new().build().is_err());
    }

    #[test]
    fn test_api_config_mapping() {
        let api = api_config_from(&test_config());
        assert_eq!(api.port, 5000);
        assert!(api.cors.enabled);
    }

    #[test]
    fn test_opcua_config_mapping() {
        let opcua = opcua_config_from(&test_config()).unwrap();
        assert_eq!(opcua.endpoint, "opc.tcp://localhost:4840");
        assert!(opcua.identity.is_anonymous());
    }

    #[test]
    fn test_opcua_config_mapping_with_credentials() {
        let mut config = test_config();
        config.source.username = Some("operator".to_string());
        config.source.password = Some("secret".to_string());

        let opcua = opcua_config_from(&config).unwrap();
        assert!(!opcua.identity.is_anonymous());
    }
}
