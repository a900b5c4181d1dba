// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Production OPC UA transport using the `opcua` crate.
//!
//! Enabled with the `opcua-client` feature. The bridge only needs the read
//! path, so this transport covers connection/session lifecycle and batch
//! value reads; security and session negotiation are delegated entirely to
//! the `opcua` stack.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use opcua::client::prelude::{
    AttributeService, Client, ClientBuilder, IdentityToken, Session,
};
use opcua::sync::RwLock as OpcUaRwLock;
use opcua::types::{
    AttributeId, DataValue, MessageSecurityMode, QualifiedName, ReadValueId, TimestampsToReturn,
    UAString, Variant,
};

use sluice_core::source::SourceState;
use sluice_core::types::SourceValue;

use crate::error::{OpcUaError, OpcUaResult};
use crate::transport::{OpcUaTransport, ReadResult};
use crate::types::{NodeId, NodeIdentifier, OpcUaConfig, SecurityMode, SecurityPolicy};

// =============================================================================
// SessionTransport
// =============================================================================

/// Real OPC UA transport backed by an `opcua` session.
pub struct SessionTransport {
    /// Transport configuration.
    config: OpcUaConfig,

    /// Current connection state.
    state: RwLock<SourceState>,

    /// The live session, when connected.
    session: RwLock<Option<Arc<OpcUaRwLock<Session>>>>,
}

impl SessionTransport {
    /// Creates a new transport for the given configuration.
    pub fn new(config: OpcUaConfig) -> Self {
        Self {
            config,
            state: RwLock::new(SourceState::Disconnected),
            session: RwLock::new(None),
        }
    }

    /// Builds the `opcua` client from configuration.
    fn build_client(&self) -> OpcUaResult<Client> {
        ClientBuilder::new()
            .application_name(self.config.application_name.as_str())
            .application_uri(self.config.application_uri.as_str())
            .trust_server_certs(self.config.trust_server_certs)
            .create_sample_keypair(self.config.uses_security())
            .session_retry_limit(0)
            .client()
            .ok_or_else(|| {
                OpcUaError::connect(&self.config.endpoint, "failed to build OPC UA client")
            })
    }

    fn security_policy_name(&self) -> &'static str {
        match self.config.security_policy {
            SecurityPolicy::None => "None",
            SecurityPolicy::Basic128Rsa15 => "Basic128Rsa15",
            SecurityPolicy::Basic256 => "Basic256",
            SecurityPolicy::Basic256Sha256 => "Basic256Sha256",
            SecurityPolicy::Aes128Sha256RsaOaep => "Aes128-Sha256-RsaOaep",
            SecurityPolicy::Aes256Sha256RsaPss => "Aes256-Sha256-RsaPss",
        }
    }

    fn message_security_mode(&self) -> MessageSecurityMode {
        match self.config.security_mode {
            SecurityMode::None => MessageSecurityMode::None,
            SecurityMode::Sign => MessageSecurityMode::Sign,
            SecurityMode::SignAndEncrypt => MessageSecurityMode::SignAndEncrypt,
        }
    }

    fn identity_token(&self) -> IdentityToken {
        match &self.config.identity {
            crate::types::IdentityToken::Anonymous => IdentityToken::Anonymous,
            crate::types::IdentityToken::UsernamePassword { username, password } => {
                IdentityToken::UserName(username.clone(), password.clone())
            }
        }
    }

    /// Converts our node id to the `opcua` representation.
    fn to_opcua_node_id(node_id: &NodeId) -> opcua::types::NodeId {
        match &node_id.identifier {
            NodeIdentifier::Numeric(v) => opcua::types::NodeId::new(node_id.namespace_index, *v),
            NodeIdentifier::String(v) => {
                opcua::types::NodeId::new(node_id.namespace_index, v.clone())
            }
            NodeIdentifier::Guid(v) => {
                opcua::types::NodeId::new(node_id.namespace_index, opcua::types::Guid::from(*v))
            }
        }
    }

    /// Converts an `opcua` variant into a source reading.
    ///
    /// Non-numeric variants become `Null`; the poller treats those as read
    /// failures since the wire format only carries numbers.
    fn from_variant(variant: &Variant) -> SourceValue {
        match variant {
            Variant::Boolean(v) => SourceValue::Bool(*v),
            Variant::SByte(v) => SourceValue::Int32(*v as i32),
            Variant::Byte(v) => SourceValue::UInt32(*v as u32),
            Variant::Int16(v) => SourceValue::Int32(*v as i32),
            Variant::UInt16(v) => SourceValue::UInt32(*v as u32),
            Variant::Int32(v) => SourceValue::Int32(*v),
            Variant::UInt32(v) => SourceValue::UInt32(*v),
            Variant::Int64(v) => SourceValue::Int64(*v),
            Variant::UInt64(v) => SourceValue::UInt64(*v),
            Variant::Float(v) => SourceValue::Float32(*v),
            Variant::Double(v) => SourceValue::Float64(*v),
            _ => SourceValue::Null,
        }
    }

    fn to_read_result(node_id: &NodeId, data_value: &DataValue) -> ReadResult {
        let status = data_value.status.as_ref().map(|s| s.bits()).unwrap_or(0);

        match &data_value.value {
            Some(variant) => {
                let source_timestamp = data_value.source_timestamp.as_ref().map(|t| {
                    chrono::DateTime::from_timestamp(
                        t.as_chrono().timestamp(),
                        t.as_chrono().timestamp_subsec_nanos(),
                    )
                    .unwrap_or_else(chrono::Utc::now)
                });

                ReadResult {
                    node_id: node_id.clone(),
                    value: Some(Self::from_variant(variant)),
                    status,
                    source_timestamp,
                }
            }
            None => ReadResult::bad(node_id.clone(), status),
        }
    }

    fn current_session(&self) -> OpcUaResult<Arc<OpcUaRwLock<Session>>> {
        self.session.read().clone().ok_or(OpcUaError::NotConnected)
    }
}

#[async_trait]
impl OpcUaTransport for SessionTransport {
    async fn connect(&self) -> OpcUaResult<()> {
        *self.state.write() = SourceState::Connecting;

        info!(endpoint = %self.config.endpoint, "Connecting to OPC UA server");

        let mut client = self.build_client()?;
        let identity_token = self.identity_token();

        let endpoint = (
            self.config.endpoint.as_str(),
            self.security_policy_name(),
            self.message_security_mode(),
            opcua::types::UserTokenPolicy::anonymous(),
        );

        let session = client
            .connect_to_endpoint(endpoint, identity_token)
            .map_err(|status| {
                *self.state.write() = SourceState::Failed;
                OpcUaError::connect(
                    &self.config.endpoint,
                    format!("connect failed with status {:?}", status),
                )
            })?;

        *self.session.write() = Some(session);
        *self.state.write() = SourceState::Connected;

        info!(endpoint = %self.config.endpoint, "Connected to OPC UA server");
        Ok(())
    }

    async fn disconnect(&self) -> OpcUaResult<()> {
        let session = self.session.write().take();

        if let Some(session) = session {
            debug!(endpoint = %self.config.endpoint, "Disconnecting OPC UA session");
            let session = session.read();
            session.disconnect();
        }

        *self.state.write() = SourceState::Disconnected;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.read().is_connected()
    }

    fn state(&self) -> SourceState {
        *self.state.read()
    }

    async fn read_values(&self, node_ids: &[NodeId]) -> OpcUaResult<Vec<ReadResult>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }

        let session = self.current_session()?;

        let read_value_ids: Vec<ReadValueId> = node_ids
            .iter()
            .map(|n| ReadValueId {
                node_id: Self::to_opcua_node_id(n),
                attribute_id: AttributeId::Value as u32,
                index_range: UAString::null(),
                data_encoding: QualifiedName::null(),
            })
            .collect();

        trace!(count = node_ids.len(), "Reading node values");

        let data_values = {
            let session = session.read();
            session
                .read(&read_value_ids, TimestampsToReturn::Both, 0.0)
                .map_err(|status| OpcUaError::service(status.bits()))?
        };

        if data_values.len() != node_ids.len() {
            return Err(OpcUaError::session(format!(
                "read returned {} values for {} nodes",
                data_values.len(),
                node_ids.len()
            )));
        }

        Ok(node_ids
            .iter()
            .zip(data_values.iter())
            .map(|(node_id, data_value)| Self::to_read_result(node_id, data_value))
            .collect())
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl std::fmt::Debug for SessionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTransport")
            .field("endpoint", &self.config.endpoint)
            .field("state", &*self.state.read())
            .finish()
    }
}
