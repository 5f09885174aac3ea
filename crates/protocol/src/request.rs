use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method name for submitting a transaction for the wallet to sign and broadcast.
pub const ETH_SEND_TRANSACTION: &str = "eth_sendTransaction";

/// JSON-RPC request forwarded to the wallet over a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
	pub method: String,
	pub params: Value,
}

impl RpcRequest {
	pub fn new(method: impl Into<String>, params: Value) -> Self {
		Self {
			method: method.into(),
			params,
		}
	}
}
