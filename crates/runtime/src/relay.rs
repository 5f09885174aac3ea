//! Relay bridge transport over WebSocket.
//!
//! The bridge is a sign-client process that owns pairing, relay encryption,
//! and key storage. This side speaks plain JSON-RPC to it:
//!
//! | Method | Params | Result |
//! |---|---|---|
//! | `client_init` | `{projectId, metadata}` | `null` |
//! | `pairing_connect` | `{requiredNamespaces}` | `{uri, proposalId}` |
//! | `pairing_approval` | `{proposalId}` | `{topic, namespaces}` once the wallet settles |
//! | `session_request` | `{topic, chainId, request: {method, params}}` | wallet result |
//! | `session_disconnect` | `{topic, reason: {code, message}}` | `null` |
//!
//! Notifications arrive as `{event, params}` frames and are broadcast to
//! [`TransportClient::subscribe`] receivers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use pairsign_protocol::{CapabilitySet, ChainId, DisconnectReason, RpcRequest, SessionSettlement};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::connection::{Connection, ResponseFuture};
use crate::error::{Error, Result};
use crate::transport::{SessionProposal, TransportClient, TransportEvent};

/// Capacity of the notification broadcast channel.
const EVENT_CAPACITY: usize = 64;

/// Dapp metadata shown by the wallet on the approval screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppMetadata {
	pub name: String,
	pub description: String,
	pub url: String,
	#[serde(default)]
	pub icons: Vec<String>,
}

impl Default for AppMetadata {
	fn default() -> Self {
		Self {
			name: "pairsign".to_string(),
			description: "Command-line wallet pairing".to_string(),
			url: "https://localhost".to_string(),
			icons: Vec::new(),
		}
	}
}

/// Settings for [`RelayTransport::connect`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
	/// `ws://` or `wss://` endpoint of the bridge.
	pub url: String,
	pub project_id: Option<String>,
	pub metadata: AppMetadata,
	/// Applied to `session_request` and `session_disconnect`, never to approvals.
	pub request_timeout: Option<Duration>,
}

impl RelayConfig {
	pub fn new(url: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			project_id: None,
			metadata: AppMetadata::default(),
			request_timeout: None,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectReply {
	uri: String,
	proposal_id: Value,
}

/// [`TransportClient`] backed by a relay bridge connection.
pub struct RelayTransport {
	connection: Arc<Connection>,
	events: broadcast::Sender<TransportEvent>,
	request_timeout: Option<Duration>,
	reader: JoinHandle<()>,
	writer: JoinHandle<()>,
}

impl RelayTransport {
	/// Opens the socket, starts the reader/writer tasks, and runs `client_init`.
	pub async fn connect(config: RelayConfig) -> Result<Self> {
		let (stream, _) = tokio_tungstenite::connect_async(config.url.as_str())
			.await
			.map_err(|e| Error::ConnectionFailed(format!("{}: {e}", config.url)))?;

		tracing::debug!(target = "pairsign.relay", url = %config.url, "relay socket open");

		let (mut sink, mut source) = stream.split();
		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();
		let (events, _) = broadcast::channel(EVENT_CAPACITY);
		let connection = Arc::new(Connection::new(outbound_tx, events.clone()));

		let writer = tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = sink.send(WsMessage::Text(message.to_string())).await {
					tracing::warn!(target = "pairsign.relay", error = %e, "socket write failed");
					break;
				}
			}
			let _ = sink.close().await;
		});

		let reader_connection = Arc::clone(&connection);
		let reader = tokio::spawn(async move {
			while let Some(frame) = source.next().await {
				match frame {
					Ok(WsMessage::Text(text)) => match serde_json::from_str::<Value>(&text) {
						Ok(value) => reader_connection.dispatch_value(value),
						Err(e) => tracing::warn!(target = "pairsign.relay", error = %e, "bridge sent invalid JSON"),
					},
					Ok(WsMessage::Close(_)) => break,
					Ok(_) => {}
					Err(e) => {
						tracing::warn!(target = "pairsign.relay", error = %e, "socket read failed");
						break;
					}
				}
			}
			tracing::debug!(target = "pairsign.relay", "relay socket closed");
			reader_connection.close();
		});

		let transport = Self {
			connection,
			events,
			request_timeout: config.request_timeout,
			reader,
			writer,
		};

		transport
			.connection
			.send_message(
				"client_init",
				json!({
					"projectId": config.project_id,
					"metadata": config.metadata,
				}),
			)
			.await
			.map_err(|e| Error::ConnectionFailed(format!("client_init: {e}")))?;

		Ok(transport)
	}

	async fn bounded(&self, what: &str, pending: ResponseFuture) -> Result<Value> {
		match self.request_timeout {
			Some(limit) => tokio::time::timeout(limit, pending)
				.await
				.map_err(|_| Error::Timeout(format!("{what} after {}ms", limit.as_millis())))?,
			None => pending.await,
		}
	}
}

impl Drop for RelayTransport {
	fn drop(&mut self) {
		self.reader.abort();
		self.writer.abort();
		self.connection.close();
	}
}

#[async_trait]
impl TransportClient for RelayTransport {
	async fn connect(&self, required: &CapabilitySet) -> Result<SessionProposal> {
		let reply = self
			.connection
			.send_message("pairing_connect", json!({ "requiredNamespaces": required }))
			.await?;
		let ConnectReply { uri, proposal_id } = serde_json::from_value(reply)?;

		let pending = self.connection.call("pairing_approval", json!({ "proposalId": proposal_id }))?;
		let requested = required.clone();
		let approval = async move {
			let settlement: SessionSettlement = serde_json::from_value(pending.await?)?;
			Ok(settlement.into_record(&requested))
		};

		Ok(SessionProposal::new(uri, approval))
	}

	async fn request(&self, topic: &str, chain_id: &ChainId, request: RpcRequest) -> Result<Value> {
		let pending = self.connection.call(
			"session_request",
			json!({
				"topic": topic,
				"chainId": chain_id,
				"request": request,
			}),
		)?;
		self.bounded("session_request", pending).await
	}

	async fn disconnect(&self, topic: &str, reason: &DisconnectReason) -> Result<()> {
		let pending = self.connection.call("session_disconnect", json!({ "topic": topic, "reason": reason }))?;
		self.bounded("session_disconnect", pending).await.map(|_| ())
	}

	fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
		self.events.subscribe()
	}
}
