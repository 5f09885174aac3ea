use serde::{Deserialize, Serialize};

/// Disconnect cause sent to the remote side along with the session topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectReason {
	pub code: i64,
	pub message: String,
}

impl DisconnectReason {
	pub const USER_DISCONNECTED: i64 = 6000;
	pub const UNSUPPORTED_ACCOUNTS: i64 = 5103;
	pub const USER_REJECTED: i64 = 5000;

	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}

	/// The dapp user chose to end the session.
	pub fn user_disconnected() -> Self {
		Self::new(Self::USER_DISCONNECTED, "User disconnected")
	}

	/// The approved session exposed no usable account.
	pub fn unsupported_accounts() -> Self {
		Self::new(Self::UNSUPPORTED_ACCOUNTS, "Unsupported accounts")
	}
}

impl Default for DisconnectReason {
	fn default() -> Self {
		Self::user_disconnected()
	}
}
