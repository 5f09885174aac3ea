//! Error types for transport clients.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a transport client can report.
#[derive(Debug, Error)]
pub enum Error {
	/// Could not reach or handshake with the relay bridge.
	#[error("Failed to connect to relay bridge: {0}")]
	ConnectionFailed(String),

	/// Peer sent something that does not fit the protocol.
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// JSON-RPC error returned by the bridge or the wallet behind it.
	#[error("{message} (code {code})")]
	Remote {
		code: i64,
		message: String,
		data: Option<Value>,
	},

	/// Timeout waiting for a reply.
	#[error("Timeout: {0}")]
	Timeout(String),

	/// The response channel was dropped before a reply arrived.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the JSON-RPC error code if this is a remote error.
	pub fn remote_code(&self) -> Option<i64> {
		match self {
			Error::Remote { code, .. } => Some(*code),
			_ => None,
		}
	}

	/// Returns true when the user declined in their wallet (codes 5000-5003).
	pub fn is_rejection(&self) -> bool {
		matches!(self.remote_code(), Some(5000..=5003))
	}

	/// Returns true if this is a timeout error.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Error::Timeout(_))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejection_codes() {
		let rejected = Error::Remote {
			code: 5000,
			message: "User rejected.".into(),
			data: None,
		};
		assert!(rejected.is_rejection());
		assert_eq!(rejected.to_string(), "User rejected. (code 5000)");

		let unrelated = Error::Remote {
			code: 6000,
			message: "User disconnected.".into(),
			data: None,
		};
		assert!(!unrelated.is_rejection());
		assert!(!Error::ChannelClosed.is_rejection());
	}
}
