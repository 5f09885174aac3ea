//! Error taxonomy for session operations.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`SessionManager`](crate::SessionManager) operations.
///
/// Nothing is retried internally: a failed approval or signing request is
/// returned to the caller, who decides whether to ask the user again.
#[derive(Debug, Error)]
pub enum Error {
	/// The transport has not finished initializing.
	#[error("transport is not ready")]
	NotReady,

	/// A session is already active; disconnect before proposing again.
	#[error("a session is already active")]
	AlreadyActive,

	/// A proposal is still waiting for the wallet.
	#[error("a proposal is already awaiting approval")]
	ProposalPending,

	/// The wallet approved a session this client cannot use.
	#[error("malformed session: {0}")]
	MalformedSession(String),

	/// The operation needs an active session.
	#[error("no active session")]
	NoActiveSession,

	/// The wallet did not approve this method for the session.
	#[error("method '{0}' was not approved for this session")]
	MethodNotApproved(String),

	/// The wallet did not answer the proposal in time.
	#[error("approval timed out after {}s", .0.as_secs())]
	ApprovalTimeout(Duration),

	#[error("invalid capabilities: {0}")]
	InvalidCapabilities(#[from] pairsign_protocol::ProtocolError),

	/// Opaque failure reported by the transport (rejection, network, signing).
	#[error("transport failure: {0}")]
	TransportFailure(#[from] pairsign_runtime::Error),

	#[error("failed to encode request: {0}")]
	Encode(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the wallet user declined.
	pub fn is_rejection(&self) -> bool {
		matches!(self, Error::TransportFailure(e) if e.is_rejection())
	}

	/// Returns true for approval and transport timeouts.
	pub fn is_timeout(&self) -> bool {
		match self {
			Error::ApprovalTimeout(_) => true,
			Error::TransportFailure(e) => e.is_timeout(),
			_ => false,
		}
	}
}
