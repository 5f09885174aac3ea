//! Command-line dapp client: pairs with a wallet through a relay bridge (or
//! the built-in loopback wallet) and sends transactions over the session.

pub mod approval;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod transport;
