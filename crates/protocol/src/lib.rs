//! Wire types shared by the pairsign runtime and session core.
//!
//! Nothing in here performs I/O. The types describe what a dapp asks a wallet
//! for ([`CapabilitySet`]), what the wallet hands back once it approves
//! ([`SessionRecord`]), and the payloads exchanged over a live session
//! ([`RpcRequest`], [`TransactionRequest`], [`DisconnectReason`]).

pub mod capability;
pub mod error;
pub mod reason;
pub mod request;
pub mod session;
pub mod transaction;

pub use capability::{CapabilitySet, CapabilitySetBuilder, ChainId};
pub use error::{ProtocolError, Result};
pub use reason::DisconnectReason;
pub use request::{ETH_SEND_TRANSACTION, RpcRequest};
pub use session::{AccountId, Address, SessionNamespace, SessionRecord, SessionSettlement, TxHash};
pub use transaction::{TransactionRequest, parse_hex_data, parse_quantity};
