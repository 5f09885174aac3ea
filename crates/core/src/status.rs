//! Session status and the read-only projection handed to display layers.

use std::fmt;

use pairsign_protocol::{AccountId, Address, ChainId, SessionRecord, TxHash};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Derives the active address from an approved record.
///
/// The first account is used, with the record's `"<chainId>:"` prefix
/// stripped exactly once.
pub fn active_address(record: &SessionRecord) -> Result<Address> {
	let first = record
		.accounts
		.first()
		.ok_or_else(|| Error::MalformedSession(format!("session {} exposes no accounts", record.topic)))?;

	first.address_on(&record.chain_id).ok_or_else(|| {
		Error::MalformedSession(format!("account '{first}' does not belong to chain {}", record.chain_id))
	})
}

/// An approved, usable session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
	record: SessionRecord,
	address: Address,
}

impl ActiveSession {
	/// Validates `record` and derives its active address.
	pub fn from_record(record: SessionRecord) -> Result<Self> {
		let address = active_address(&record)?;
		Ok(Self { record, address })
	}

	pub fn record(&self) -> &SessionRecord {
		&self.record
	}

	pub fn topic(&self) -> &str {
		&self.record.topic
	}

	pub fn chain_id(&self) -> &ChainId {
		&self.record.chain_id
	}

	pub fn accounts(&self) -> &[AccountId] {
		&self.record.accounts
	}

	pub fn address(&self) -> &Address {
		&self.address
	}
}

/// Why a proposal ended in [`SessionStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
	/// The wallet user declined.
	Rejected(String),
	Timeout,
	/// The approved session was unusable.
	Malformed(String),
	Transport(String),
}

impl fmt::Display for FailureReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FailureReason::Rejected(msg) => write!(f, "rejected by wallet: {msg}"),
			FailureReason::Timeout => write!(f, "approval timed out"),
			FailureReason::Malformed(msg) => write!(f, "malformed session: {msg}"),
			FailureReason::Transport(msg) => write!(f, "transport failure: {msg}"),
		}
	}
}

/// Lifecycle state. A [`SessionRecord`] exists exactly when this is `Active`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
	#[default]
	Idle,
	Proposing,
	AwaitingApproval,
	Active(ActiveSession),
	Disconnected,
	Failed(FailureReason),
}

impl SessionStatus {
	pub fn kind(&self) -> StatusKind {
		match self {
			SessionStatus::Idle => StatusKind::Idle,
			SessionStatus::Proposing => StatusKind::Proposing,
			SessionStatus::AwaitingApproval => StatusKind::AwaitingApproval,
			SessionStatus::Active(_) => StatusKind::Active,
			SessionStatus::Disconnected => StatusKind::Disconnected,
			SessionStatus::Failed(_) => StatusKind::Failed,
		}
	}

	pub fn is_active(&self) -> bool {
		matches!(self, SessionStatus::Active(_))
	}

	/// Proposing or awaiting approval.
	pub fn is_pending(&self) -> bool {
		matches!(self, SessionStatus::Proposing | SessionStatus::AwaitingApproval)
	}

	pub fn active(&self) -> Option<&ActiveSession> {
		match self {
			SessionStatus::Active(session) => Some(session),
			_ => None,
		}
	}
}

/// Data-free status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
	Idle,
	Proposing,
	AwaitingApproval,
	Active,
	Disconnected,
	Failed,
}

impl fmt::Display for StatusKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			StatusKind::Idle => "idle",
			StatusKind::Proposing => "proposing",
			StatusKind::AwaitingApproval => "awaiting_approval",
			StatusKind::Active => "active",
			StatusKind::Disconnected => "disconnected",
			StatusKind::Failed => "failed",
		};
		f.write_str(label)
	}
}

/// Everything the manager publishes on each transition.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
	pub status: SessionStatus,
	/// Bumped by every proposal; ties an active session to the proposal that
	/// created it.
	pub generation: u64,
	/// Identifier of the last successful send. Reset when a new session
	/// activates, kept after disconnect.
	pub last_tx: Option<TxHash>,
}

impl SessionSnapshot {
	pub fn view(&self) -> SessionView {
		let active = self.status.active();
		SessionView {
			status: self.status.kind(),
			reason: match &self.status {
				SessionStatus::Failed(reason) => Some(reason.to_string()),
				_ => None,
			},
			topic: active.map(|s| s.topic().to_string()),
			chain_id: active.map(|s| s.chain_id().clone()),
			address: active.map(|s| s.address().clone()),
			last_tx: self.last_tx.clone(),
		}
	}
}

/// Read-only projection for display: status, active address, last tx.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
	pub status: StatusKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub topic: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<ChainId>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_tx: Option<TxHash>,
}
