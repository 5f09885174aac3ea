//! The transport capability the session core is written against.
//!
//! A transport owns the pairing/relay machinery. The core only ever needs four
//! things from it: open a proposal, forward a request over an approved
//! session, end a session, and hear about sessions the remote side ended.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use pairsign_protocol::{CapabilitySet, ChainId, DisconnectReason, RpcRequest, SessionRecord};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;

/// Wallet emitted `session_delete`: the remote side tore the session down.
pub const SESSION_DELETE: &str = "session_delete";
/// Session reached its expiry.
pub const SESSION_EXPIRE: &str = "session_expire";
/// Wallet changed the session's namespaces.
pub const SESSION_UPDATE: &str = "session_update";
/// Chain-level event forwarded by the wallet (e.g. `accountsChanged`).
pub const SESSION_EVENT: &str = "session_event";

/// Future resolving once the wallet approves or rejects a proposal.
///
/// Dropping it abandons the proposal; transports must not resolve a dropped
/// approval into a session.
pub type ApprovalFuture = Pin<Box<dyn Future<Output = Result<SessionRecord>> + Send + 'static>>;

/// Result of `connect`: a URI for the wallet to open plus the pending approval.
pub struct SessionProposal {
	pub pairing_uri: String,
	pub approval: ApprovalFuture,
}

impl SessionProposal {
	pub fn new(pairing_uri: impl Into<String>, approval: impl Future<Output = Result<SessionRecord>> + Send + 'static) -> Self {
		Self {
			pairing_uri: pairing_uri.into(),
			approval: Box::pin(approval),
		}
	}
}

impl fmt::Debug for SessionProposal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionProposal")
			.field("pairing_uri", &self.pairing_uri)
			.finish_non_exhaustive()
	}
}

/// Unsolicited lifecycle signal from the remote side.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
	SessionDeleted { topic: Option<String> },
	SessionExpired { topic: Option<String> },
	SessionUpdated { topic: Option<String>, params: Value },
	SessionEvent { topic: Option<String>, name: String, data: Value },
	Other { name: String, params: Value },
}

impl TransportEvent {
	/// Decodes an `{event, params}` wire notification.
	pub fn from_wire(name: &str, params: Value) -> Self {
		let topic = params.get("topic").and_then(Value::as_str).map(str::to_string);
		match name {
			SESSION_DELETE => TransportEvent::SessionDeleted { topic },
			SESSION_EXPIRE => TransportEvent::SessionExpired { topic },
			SESSION_UPDATE => TransportEvent::SessionUpdated { topic, params },
			SESSION_EVENT => {
				let event = params.pointer("/params/event").cloned().unwrap_or(Value::Null);
				TransportEvent::SessionEvent {
					topic,
					name: event.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
					data: event.get("data").cloned().unwrap_or(Value::Null),
				}
			}
			other => TransportEvent::Other {
				name: other.to_string(),
				params,
			},
		}
	}

	pub fn name(&self) -> &str {
		match self {
			TransportEvent::SessionDeleted { .. } => SESSION_DELETE,
			TransportEvent::SessionExpired { .. } => SESSION_EXPIRE,
			TransportEvent::SessionUpdated { .. } => SESSION_UPDATE,
			TransportEvent::SessionEvent { .. } => SESSION_EVENT,
			TransportEvent::Other { name, .. } => name,
		}
	}

	pub fn topic(&self) -> Option<&str> {
		match self {
			TransportEvent::SessionDeleted { topic }
			| TransportEvent::SessionExpired { topic }
			| TransportEvent::SessionUpdated { topic, .. }
			| TransportEvent::SessionEvent { topic, .. } => topic.as_deref(),
			TransportEvent::Other { .. } => None,
		}
	}

	/// True for signals meaning the remote session no longer exists.
	pub fn is_termination(&self) -> bool {
		matches!(self, TransportEvent::SessionDeleted { .. } | TransportEvent::SessionExpired { .. })
	}
}

/// Pairing/relay client consumed by the session core.
#[async_trait]
pub trait TransportClient: Send + Sync {
	/// Opens a proposal for `required` and returns its pairing URI and approval.
	async fn connect(&self, required: &CapabilitySet) -> Result<SessionProposal>;

	/// Forwards `request` over the session addressed by `topic`.
	async fn request(&self, topic: &str, chain_id: &ChainId, request: RpcRequest) -> Result<Value>;

	/// Ends the session addressed by `topic`.
	async fn disconnect(&self, topic: &str, reason: &DisconnectReason) -> Result<()>;

	/// Subscribes to remote lifecycle signals.
	fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn session_delete_decodes_topic() {
		let event = TransportEvent::from_wire(SESSION_DELETE, json!({"id": 7, "topic": "t1"}));
		assert_eq!(event, TransportEvent::SessionDeleted { topic: Some("t1".into()) });
		assert!(event.is_termination());
		assert_eq!(event.topic(), Some("t1"));
	}

	#[test]
	fn session_event_extracts_name_and_data() {
		let event = TransportEvent::from_wire(
			SESSION_EVENT,
			json!({
				"topic": "t1",
				"params": {"event": {"name": "accountsChanged", "data": ["0xBEEF"]}, "chainId": "eip155:5"}
			}),
		);
		match &event {
			TransportEvent::SessionEvent { name, data, .. } => {
				assert_eq!(name, "accountsChanged");
				assert_eq!(data, &json!(["0xBEEF"]));
			}
			other => panic!("expected SessionEvent, got {other:?}"),
		}
		assert!(!event.is_termination());
	}

	#[test]
	fn unknown_event_is_kept() {
		let event = TransportEvent::from_wire("session_ping", json!({}));
		assert_eq!(event.name(), "session_ping");
		assert_eq!(event.topic(), None);
	}
}
