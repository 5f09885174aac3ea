//! Client-side session manager for dapp-to-wallet pairings.
//!
//! A dapp declares what it needs ([`CapabilitySet`]), proposes a session
//! through a [`TransportClient`], shows the pairing URI on an
//! [`ApprovalSurface`], and once the wallet approves, routes signing requests
//! over the session until either side ends it.
//!
//! ```ignore
//! use pairsign::{CapabilitySet, ChainId, Headless, SessionConfig, SessionManager};
//! use pairsign_runtime::LoopbackTransport;
//!
//! let manager = SessionManager::with_transport(LoopbackTransport::default(), Headless, SessionConfig::default());
//! let caps = CapabilitySet::builder()
//!     .chain(ChainId::parse("eip155:5")?)
//!     .method("eth_sendTransaction")
//!     .build()?;
//!
//! let pending = manager.propose(&caps).await?;
//! println!("scan {}", pending.pairing_uri());
//! let session = pending.approved().await?;
//! println!("connected as {}", session.address());
//! ```
//!
//! Remote signals (`session_delete`, `session_expire`) are consumed by a
//! single background listener attached when the transport is initialized.

pub mod approval;
pub mod config;
mod dispatcher;
pub mod error;
mod listener;
pub mod session;
pub mod status;

pub use approval::{ApprovalSurface, Headless};
pub use config::{DEFAULT_APPROVAL_TIMEOUT, SessionConfig};
pub use error::{Error, Result};
pub use pairsign_protocol::{
	AccountId, Address, CapabilitySet, ChainId, DisconnectReason, ETH_SEND_TRANSACTION, TransactionRequest, TxHash,
};
pub use pairsign_runtime::{TransportClient, TransportEvent};
pub use session::{PendingSession, SessionManager};
pub use status::{ActiveSession, FailureReason, SessionSnapshot, SessionStatus, SessionView, StatusKind, active_address};
