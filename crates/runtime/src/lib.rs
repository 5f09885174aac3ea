//! Transport clients for wallet pairing.
//!
//! This crate provides the concrete side of the transport capability the
//! session core consumes:
//!
//! - **Transport trait**: [`TransportClient`] with connect / request /
//!   disconnect / subscribe
//! - **Connection**: JSON-RPC request/response correlation and notification
//!   broadcast
//! - **Relay**: [`RelayTransport`], a WebSocket client for a sign-client bridge
//! - **Loopback**: [`LoopbackTransport`], an in-memory wallet for demos and tests
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   pairsign   │  Session state machine
//! └──────┬───────┘
//!        │ TransportClient
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │ Relay  │──┼──► bridge (WebSocket, JSON-RPC)
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │Loopback│  │  in-process wallet
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod loopback;
pub mod relay;
pub mod transport;

pub use connection::{Connection, Message, Notification, Request, Response, ResponseFuture};
pub use error::{Error, Result};
pub use loopback::{ApprovalBehavior, LoopbackTransport, LoopbackWallet, RecordedDisconnect, RecordedRequest, RequestBehavior};
pub use relay::{AppMetadata, RelayConfig, RelayTransport};
pub use transport::{ApprovalFuture, SessionProposal, TransportClient, TransportEvent};
