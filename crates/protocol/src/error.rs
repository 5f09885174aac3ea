use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Validation failures for wire values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
	#[error("invalid chain id '{0}': expected '<namespace>:<reference>'")]
	InvalidChainId(String),

	#[error("capability set must declare at least one chain")]
	NoChains,

	#[error("capability set mixes namespaces '{first}' and '{second}'")]
	MixedNamespaces { first: String, second: String },

	#[error("invalid quantity '{0}': expected decimal or 0x-prefixed hex")]
	InvalidQuantity(String),

	#[error("invalid hex data '{0}'")]
	InvalidHex(String),
}
