// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The OPC UA source client adapter.
//!
//! [`OpcUaClient`] implements `sluice_core`'s [`SourceClient`] on top of an
//! [`OpcUaTransport`]. Its responsibilities:
//!
//! - parse tag addresses into [`NodeId`]s (a bad address is a per-tag read
//!   failure, never a reason to tear the session down),
//! - bound connects and read service calls with the configured timeouts,
//! - split OPC UA failures into the poller's two classes: per-address read
//!   errors inside the result vector, session-level failures as a top-level
//!   error.

use async_trait::async_trait;
use tracing::{debug, trace};

use sluice_core::error::{SourceError, SourceResult};
use sluice_core::source::{AddressRead, SourceClient, SourceState};
use sluice_core::types::SourceValue;

use crate::error::is_session_status;
use crate::transport::OpcUaTransport;
use crate::types::{NodeId, OpcUaConfig};

// =============================================================================
// OpcUaClient
// =============================================================================

/// OPC UA implementation of [`SourceClient`].
///
/// # Example
///
/// ```rust,ignore
/// use sluice_opcua::{OpcUaClient, SessionTransport};
/// use sluice_opcua::types::OpcUaConfig;
///
/// let config = OpcUaConfig::builder()
///     .endpoint("opc.tcp://192.168.1.100:4840")
///     .build()?;
///
/// let client = OpcUaClient::new(config.clone(), SessionTransport::new(config));
/// client.connect().await?;
/// ```
pub struct OpcUaClient<T: OpcUaTransport> {
    config: OpcUaConfig,
    transport: T,
}

impl<T: OpcUaTransport> OpcUaClient<T> {
    /// Creates a client over the given transport.
    pub fn new(config: OpcUaConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OpcUaConfig {
        &self.config
    }

    /// Runs `future` with the given deadline, mapping expiry to a timeout
    /// error (which the poller classifies as connection loss).
    async fn with_deadline<F, R>(
        &self,
        deadline: std::time::Duration,
        future: F,
    ) -> SourceResult<R>
    where
        F: std::future::Future<Output = crate::error::OpcUaResult<R>>,
    {
        match tokio::time::timeout(deadline, future).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(SourceError::timeout(deadline)),
        }
    }
}

#[async_trait]
impl<T: OpcUaTransport> SourceClient for OpcUaClient<T> {
    async fn connect(&self) -> SourceResult<()> {
        debug!(endpoint = %self.config.endpoint, "Connecting OPC UA session");
        self.with_deadline(self.config.connect_timeout, self.transport.connect())
            .await
    }

    async fn read_values(&self, addresses: &[String]) -> SourceResult<Vec<AddressRead>> {
        let mut outcomes: Vec<Option<SourceResult<SourceValue>>> = vec![None; addresses.len()];

        // Addresses that do not parse fail individually; the rest go to the
        // server in one batch.
        let mut batch_indices = Vec::with_capacity(addresses.len());
        let mut node_ids = Vec::with_capacity(addresses.len());
        for (index, address) in addresses.iter().enumerate() {
            match address.parse::<NodeId>() {
                Ok(node_id) => {
                    batch_indices.push(index);
                    node_ids.push(node_id);
                }
                Err(e) => {
                    outcomes[index] = Some(Err(SourceError::read_failed(address, e.to_string())));
                }
            }
        }

        if !node_ids.is_empty() {
            let results = self
                .with_deadline(
                    self.config.request_timeout,
                    self.transport.read_values(&node_ids),
                )
                .await?;

            if results.len() != node_ids.len() {
                return Err(SourceError::protocol(format!(
                    "server returned {} results for {} nodes",
                    results.len(),
                    node_ids.len()
                )));
            }

            // A session-level status on any node means the session is gone;
            // report the whole cycle as a connection loss so the poller
            // reconnects instead of marking every tag stale forever.
            if let Some(dead) = results.iter().find(|r| is_session_status(r.status)) {
                return Err(SourceError::connection(format!(
                    "session-level status 0x{:08X} reading {}",
                    dead.status, dead.node_id
                )));
            }

            for (&index, result) in batch_indices.iter().zip(results.iter()) {
                let address = &addresses[index];
                let outcome = if result.is_good() {
                    match &result.value {
                        Some(value) => {
                            trace!(address = %address, value = %value, "Node read");
                            Ok(value.clone())
                        }
                        None => Err(SourceError::read_failed(
                            address,
                            "good status but no value",
                        )),
                    }
                } else {
                    Err(SourceError::read_failed(
                        address,
                        format!("status 0x{:08X}", result.status),
                    ))
                };
                outcomes[index] = Some(outcome);
            }
        }

        Ok(addresses
            .iter()
            .cloned()
            .zip(outcomes)
            .map(|(address, outcome)| {
                let outcome = outcome
                    .unwrap_or_else(|| Err(SourceError::read_failed(address.as_str(), "no result")));
                (address, outcome)
            })
            .collect())
    }

    async fn close(&self) -> SourceResult<()> {
        debug!(endpoint = %self.config.endpoint, "Closing OPC UA session");
        self.transport.disconnect().await.map_err(Into::into)
    }

    fn state(&self) -> SourceState {
        self.transport.state()
    }

    fn display_name(&self) -> String {
        self.config.endpoint.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
