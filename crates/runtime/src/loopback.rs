//! In-process wallet for demos and tests.
//!
//! [`LoopbackTransport`] answers proposals and requests itself instead of
//! going through a relay. Its behavior is scripted through
//! [`LoopbackWallet`] and [`RequestBehavior`], and it records every request
//! and disconnect it receives so callers can assert on the traffic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pairsign_protocol::{
	AccountId, Address, CapabilitySet, ChainId, DisconnectReason, ETH_SEND_TRANSACTION, RpcRequest, SessionRecord,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{Error, Result};
use crate::transport::{SessionProposal, TransportClient, TransportEvent};

const EVENT_CAPACITY: usize = 16;

/// Address the loopback wallet exposes unless configured otherwise.
pub const DEFAULT_ADDRESS: &str = "0x5A0b54D5dc17e0AadC383d2db43B0a0D3E029c4c";

/// How the wallet answers a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalBehavior {
	Approve,
	/// Decline with code 5000.
	Reject(String),
	/// Never answer.
	Never,
}

/// How the wallet answers session requests.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBehavior {
	/// `eth_sendTransaction` yields a fresh hash, other methods `null`.
	Succeed,
	/// Return this value verbatim.
	Respond(Value),
	Fail { code: i64, message: String },
	/// Never answer.
	Never,
}

/// Scripted wallet behavior.
#[derive(Debug, Clone)]
pub struct LoopbackWallet {
	pub address: Address,
	/// Fixed session topic; generated per session when unset.
	pub topic: Option<String>,
	/// Replaces the derived `[<chain>:<address>]` account list when set.
	pub accounts: Option<Vec<AccountId>>,
	pub approval: ApprovalBehavior,
	pub approval_delay: Duration,
	pub connect_delay: Duration,
	pub requests: RequestBehavior,
}

impl Default for LoopbackWallet {
	fn default() -> Self {
		Self {
			address: Address::new(DEFAULT_ADDRESS),
			topic: None,
			accounts: None,
			approval: ApprovalBehavior::Approve,
			approval_delay: Duration::ZERO,
			connect_delay: Duration::ZERO,
			requests: RequestBehavior::Succeed,
		}
	}
}

impl LoopbackWallet {
	pub fn with_address(mut self, address: impl Into<Address>) -> Self {
		self.address = address.into();
		self
	}

	pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
		self.topic = Some(topic.into());
		self
	}

	pub fn with_accounts(mut self, accounts: Vec<AccountId>) -> Self {
		self.accounts = Some(accounts);
		self
	}

	pub fn with_approval(mut self, approval: ApprovalBehavior) -> Self {
		self.approval = approval;
		self
	}

	pub fn with_approval_delay(mut self, delay: Duration) -> Self {
		self.approval_delay = delay;
		self
	}

	pub fn with_connect_delay(mut self, delay: Duration) -> Self {
		self.connect_delay = delay;
		self
	}

	pub fn with_requests(mut self, requests: RequestBehavior) -> Self {
		self.requests = requests;
		self
	}
}

/// A request the wallet received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
	pub topic: String,
	pub chain_id: ChainId,
	pub request: RpcRequest,
}

/// A disconnect the wallet received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDisconnect {
	pub topic: String,
	pub reason: DisconnectReason,
}

#[derive(Default)]
struct State {
	topics: Vec<String>,
	next_topic: u64,
	next_tx: u64,
	connects: usize,
	requests: Vec<RecordedRequest>,
	disconnects: Vec<RecordedDisconnect>,
}

struct Inner {
	wallet: Mutex<LoopbackWallet>,
	state: Mutex<State>,
	events: broadcast::Sender<TransportEvent>,
}

/// [`TransportClient`] whose remote side is an in-memory wallet.
#[derive(Clone)]
pub struct LoopbackTransport {
	inner: Arc<Inner>,
}

impl LoopbackTransport {
	pub fn new(wallet: LoopbackWallet) -> Self {
		let (events, _) = broadcast::channel(EVENT_CAPACITY);
		Self {
			inner: Arc::new(Inner {
				wallet: Mutex::new(wallet),
				state: Mutex::new(State::default()),
				events,
			}),
		}
	}

	/// Changes how later requests are answered.
	pub fn set_requests(&self, requests: RequestBehavior) {
		self.inner.wallet.lock().requests = requests;
	}

	/// Changes how later proposals are answered.
	pub fn set_approval(&self, approval: ApprovalBehavior) {
		self.inner.wallet.lock().approval = approval;
	}

	/// Ends `topic` from the wallet side and emits `session_delete`.
	pub fn delete_session(&self, topic: &str) {
		self.inner.state.lock().topics.retain(|t| t != topic);
		tracing::debug!(target = "pairsign.loopback", topic, "wallet deleted session");
		self.emit(TransportEvent::SessionDeleted {
			topic: Some(topic.to_string()),
		});
	}

	pub fn emit(&self, event: TransportEvent) {
		let _ = self.inner.events.send(event);
	}

	/// Topics of sessions the wallet still considers live.
	pub fn active_topics(&self) -> Vec<String> {
		self.inner.state.lock().topics.clone()
	}

	pub fn connect_count(&self) -> usize {
		self.inner.state.lock().connects
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.inner.state.lock().requests.clone()
	}

	pub fn disconnects(&self) -> Vec<RecordedDisconnect> {
		self.inner.state.lock().disconnects.clone()
	}

	/// Number of live event subscriptions.
	pub fn subscriber_count(&self) -> usize {
		self.inner.events.receiver_count()
	}
}

impl Default for LoopbackTransport {
	fn default() -> Self {
		Self::new(LoopbackWallet::default())
	}
}

impl Inner {
	fn settle(&self, requested: &CapabilitySet) -> SessionRecord {
		let wallet = self.wallet.lock().clone();
		let chain_id = requested.primary_chain().clone();

		let mut state = self.state.lock();
		state.next_topic += 1;
		let topic = wallet
			.topic
			.unwrap_or_else(|| format!("loopback-{:016x}", state.next_topic));
		state.topics.push(topic.clone());

		SessionRecord {
			topic,
			accounts: wallet
				.accounts
				.unwrap_or_else(|| vec![AccountId::on_chain(&chain_id, &wallet.address)]),
			chain_id,
			capabilities: requested.clone(),
		}
	}
}

#[async_trait]
impl TransportClient for LoopbackTransport {
	async fn connect(&self, required: &CapabilitySet) -> Result<SessionProposal> {
		let (connect_delay, approval, approval_delay) = {
			let wallet = self.inner.wallet.lock();
			(wallet.connect_delay, wallet.approval.clone(), wallet.approval_delay)
		};

		let pairing = {
			let mut state = self.inner.state.lock();
			state.connects += 1;
			state.connects
		};

		if !connect_delay.is_zero() {
			tokio::time::sleep(connect_delay).await;
		}

		let uri = format!(
			"wc:{}@2?relay-protocol=loopback&symKey={}",
			hex::encode((pairing as u64).to_be_bytes()),
			hex::encode([0u8; 8])
		);

		let inner = Arc::clone(&self.inner);
		let requested = required.clone();
		let pending = async move {
			if !approval_delay.is_zero() {
				tokio::time::sleep(approval_delay).await;
			}
			match approval {
				ApprovalBehavior::Approve => Ok(inner.settle(&requested)),
				ApprovalBehavior::Reject(message) => Err(Error::Remote {
					code: DisconnectReason::USER_REJECTED,
					message,
					data: None,
				}),
				ApprovalBehavior::Never => std::future::pending().await,
			}
		};

		Ok(SessionProposal::new(uri, pending))
	}

	async fn request(&self, topic: &str, chain_id: &ChainId, request: RpcRequest) -> Result<Value> {
		let behavior = self.inner.wallet.lock().requests.clone();
		let is_send = request.method == ETH_SEND_TRANSACTION;

		let tx_number = {
			let mut state = self.inner.state.lock();
			state.requests.push(RecordedRequest {
				topic: topic.to_string(),
				chain_id: chain_id.clone(),
				request,
			});
			if !state.topics.iter().any(|t| t == topic) {
				return Err(Error::ProtocolError(format!("No matching session: {topic}")));
			}
			state.next_tx += 1;
			state.next_tx
		};

		match behavior {
			RequestBehavior::Succeed if is_send => Ok(Value::String(format!("0x{tx_number:064x}"))),
			RequestBehavior::Succeed => Ok(Value::Null),
			RequestBehavior::Respond(value) => Ok(value),
			RequestBehavior::Fail { code, message } => Err(Error::Remote {
				code,
				message,
				data: None,
			}),
			RequestBehavior::Never => std::future::pending().await,
		}
	}

	async fn disconnect(&self, topic: &str, reason: &DisconnectReason) -> Result<()> {
		let mut state = self.inner.state.lock();
		state.disconnects.push(RecordedDisconnect {
			topic: topic.to_string(),
			reason: reason.clone(),
		});

		let before = state.topics.len();
		state.topics.retain(|t| t != topic);
		if state.topics.len() == before {
			return Err(Error::ProtocolError(format!("No matching session: {topic}")));
		}
		Ok(())
	}

	fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
		self.inner.events.subscribe()
	}
}
