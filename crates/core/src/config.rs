use std::time::Duration;

use pairsign_protocol::DisconnectReason;

/// Default wait for the wallet to answer a proposal.
pub const DEFAULT_APPROVAL_TIMEOUT: Duration = Duration::from_secs(300);

/// Policy knobs for a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// `None` waits for the wallet indefinitely.
	pub approval_timeout: Option<Duration>,
	/// Sent with locally requested disconnects.
	pub disconnect_reason: DisconnectReason,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			approval_timeout: Some(DEFAULT_APPROVAL_TIMEOUT),
			disconnect_reason: DisconnectReason::user_disconnected(),
		}
	}
}

impl SessionConfig {
	pub fn with_approval_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.approval_timeout = timeout;
		self
	}

	pub fn with_disconnect_reason(mut self, reason: DisconnectReason) -> Self {
		self.disconnect_reason = reason;
		self
	}
}
