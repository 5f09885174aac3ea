//! Transport selection for the CLI.

use async_trait::async_trait;
use pairsign::{CapabilitySet, ChainId, DisconnectReason, TransportClient, TransportEvent};
use pairsign_protocol::RpcRequest;
use pairsign_runtime::{LoopbackTransport, LoopbackWallet, RelayConfig, RelayTransport, SessionProposal};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::Settings;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
	/// WebSocket relay bridge
	#[default]
	Relay,
	/// Built-in wallet that approves everything (demos, tests)
	Loopback,
}

/// Whichever transport the settings selected.
pub enum CliTransport {
	Relay(RelayTransport),
	Loopback(LoopbackTransport),
}

impl CliTransport {
	/// Opens the transport described by `settings`.
	pub async fn open(settings: &Settings) -> pairsign_runtime::Result<Self> {
		match settings.transport {
			TransportKind::Relay => {
				let mut config = RelayConfig::new(settings.relay_url.as_str());
				config.project_id = settings.project_id.clone();
				info!(target = "pairsign", url = %settings.relay_url, "connecting to relay bridge");
				Ok(CliTransport::Relay(RelayTransport::connect(config).await?))
			}
			TransportKind::Loopback => {
				info!(target = "pairsign", "using loopback wallet");
				Ok(CliTransport::Loopback(LoopbackTransport::new(LoopbackWallet::default())))
			}
		}
	}

	fn inner(&self) -> &dyn TransportClient {
		match self {
			CliTransport::Relay(relay) => relay,
			CliTransport::Loopback(loopback) => loopback,
		}
	}
}

#[async_trait]
impl TransportClient for CliTransport {
	async fn connect(&self, required: &CapabilitySet) -> pairsign_runtime::Result<SessionProposal> {
		self.inner().connect(required).await
	}

	async fn request(&self, topic: &str, chain_id: &ChainId, request: RpcRequest) -> pairsign_runtime::Result<Value> {
		self.inner().request(topic, chain_id, request).await
	}

	async fn disconnect(&self, topic: &str, reason: &DisconnectReason) -> pairsign_runtime::Result<()> {
		self.inner().disconnect(topic, reason).await
	}

	fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
		self.inner().subscribe()
	}
}
