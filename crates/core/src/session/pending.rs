use std::fmt;
use std::sync::Arc;

use pairsign_protocol::DisconnectReason;
use pairsign_runtime::{ApprovalFuture, SessionProposal, TransportClient};
use tracing::{debug, info, warn};

use super::Shared;
use crate::error::{Error, Result};
use crate::status::{ActiveSession, FailureReason, SessionStatus};

/// A proposal the wallet has not answered yet.
///
/// The pairing URI is available immediately. Dropping the value before
/// [`approved`](Self::approved) resolves abandons the proposal: the approval
/// future is dropped, the surface dismissed and the manager returns to `Idle`.
#[must_use = "dropping a PendingSession abandons the proposal"]
pub struct PendingSession {
	shared: Arc<Shared>,
	transport: Arc<dyn TransportClient>,
	approval: Option<ApprovalFuture>,
	pairing_uri: String,
	generation: u64,
	settled: bool,
}

impl PendingSession {
	pub(super) fn new(
		shared: Arc<Shared>,
		transport: Arc<dyn TransportClient>,
		proposal: SessionProposal,
		generation: u64,
	) -> Self {
		Self {
			shared,
			transport,
			approval: Some(proposal.approval),
			pairing_uri: proposal.pairing_uri,
			generation,
			settled: false,
		}
	}

	/// URI the wallet opens to answer the proposal.
	pub fn pairing_uri(&self) -> &str {
		&self.pairing_uri
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Waits for the wallet's answer, bounded by the configured approval
	/// timeout.
	pub async fn approved(mut self) -> Result<ActiveSession> {
		let Some(approval) = self.approval.take() else {
			return Err(Error::NoActiveSession);
		};

		let outcome = match self.shared.config.approval_timeout {
			Some(limit) => match tokio::time::timeout(limit, approval).await {
				Ok(outcome) => outcome,
				Err(_) => {
					self.settle(FailureReason::Timeout);
					warn!(
						target = "pairsign.session",
						generation = self.generation,
						timeout_secs = limit.as_secs(),
						"approval timed out"
					);
					return Err(Error::ApprovalTimeout(limit));
				}
			},
			None => approval.await,
		};

		let record = match outcome {
			Ok(record) => record,
			Err(err) => {
				let reason = if err.is_rejection() {
					FailureReason::Rejected(err.to_string())
				} else {
					FailureReason::Transport(err.to_string())
				};
				self.settle(reason);
				warn!(target = "pairsign.session", generation = self.generation, error = %err, "approval failed");
				return Err(err.into());
			}
		};

		let topic = record.topic.clone();
		match ActiveSession::from_record(record) {
			Ok(session) => {
				self.settled = true;
				self.shared.surface.dismiss();
				if !self
					.shared
					.settle_pending(self.generation, SessionStatus::Active(session.clone()))
				{
					return Err(Error::NoActiveSession);
				}
				info!(
					target = "pairsign.session",
					topic = session.topic(),
					address = %session.address(),
					chain = %session.chain_id(),
					"session active"
				);
				Ok(session)
			}
			Err(err) => {
				let detail = match &err {
					Error::MalformedSession(detail) => detail.clone(),
					other => other.to_string(),
				};
				self.settle(FailureReason::Malformed(detail));
				warn!(target = "pairsign.session", %topic, error = %err, "wallet approved an unusable session");

				let reason = DisconnectReason::unsupported_accounts();
				if let Err(cleanup) = self.transport.disconnect(&topic, &reason).await {
					warn!(target = "pairsign.session", %topic, error = %cleanup, "failed to tear down malformed session");
				}
				Err(err)
			}
		}
	}

	/// Abandons the proposal. Equivalent to dropping it.
	pub fn abandon(self) {
		info!(target = "pairsign.session", generation = self.generation, "proposal abandoned");
	}

	fn settle(&mut self, reason: FailureReason) {
		self.settled = true;
		self.shared.surface.dismiss();
		self.shared.settle_pending(self.generation, SessionStatus::Failed(reason));
	}
}

impl Drop for PendingSession {
	fn drop(&mut self) {
		if self.settled {
			return;
		}
		self.approval = None;
		self.shared.surface.dismiss();
		if self.shared.settle_pending(self.generation, SessionStatus::Idle) {
			debug!(target = "pairsign.session", generation = self.generation, "pending proposal cancelled");
		}
	}
}

impl fmt::Debug for PendingSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PendingSession")
			.field("pairing_uri", &self.pairing_uri)
			.field("generation", &self.generation)
			.field("settled", &self.settled)
			.finish_non_exhaustive()
	}
}
