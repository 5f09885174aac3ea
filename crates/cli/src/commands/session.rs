//! Session operations shared by `shell` and `flow`.

use pairsign::{Address, CapabilitySet, SessionManager, TransactionRequest};
use pairsign_protocol::{parse_hex_data, parse_quantity};
use tracing::warn;

use crate::approval::TerminalSurface;
use crate::cli::TxArgs;
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::output::{SendData, StatusData, explorer_link};
use crate::transport::CliTransport;

/// One manager plus the settings it was built from.
pub struct SessionContext {
	manager: SessionManager,
	capabilities: CapabilitySet,
	explorer: Option<url::Url>,
}

impl SessionContext {
	/// Builds the manager and opens the configured transport.
	pub async fn open(settings: &Settings) -> Result<Self> {
		let capabilities = settings.capabilities()?;
		let manager = SessionManager::new(TerminalSurface, settings.session_config());

		manager
			.init_transport(|| CliTransport::open(settings))
			.await
			.map_err(|err| match err {
				pairsign::Error::TransportFailure(inner) => CliError::Transport(inner),
				other => CliError::Session(other),
			})?;

		Ok(Self {
			manager,
			capabilities,
			explorer: settings.explorer_url.clone(),
		})
	}

	/// Proposes a session and waits for the wallet's answer.
	pub async fn connect(&self) -> Result<StatusData> {
		let pending = self.manager.propose(&self.capabilities).await?;
		pending.approved().await?;
		Ok(self.status())
	}

	pub async fn send(&self, args: &TxArgs) -> Result<SendData> {
		self.send_transaction(build_transaction(args)?).await
	}

	pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<SendData> {
		let to = tx.to.clone();
		let from = match &tx.from {
			Some(from) => from.clone(),
			None => self.manager.active_address().ok_or(pairsign::Error::NoActiveSession)?,
		};

		let tx_hash = self.manager.sign_and_send(tx).await?;
		Ok(SendData {
			explorer_url: self.explorer.as_ref().and_then(|base| explorer_link(base, &tx_hash)),
			tx_hash,
			from,
			to,
		})
	}

	pub async fn disconnect(&self) -> Result<StatusData> {
		self.manager.disconnect().await?;
		Ok(self.status())
	}

	pub fn status(&self) -> StatusData {
		StatusData::from_view(self.manager.view(), self.explorer.as_ref())
	}

	/// Ends any active session; failures are logged, not returned.
	pub async fn shutdown(&self) {
		if let Err(err) = self.manager.shutdown().await {
			warn!(target = "pairsign", error = %err, "disconnect during shutdown failed");
		}
	}
}

/// Validates the transaction flags.
pub fn build_transaction(args: &TxArgs) -> Result<TransactionRequest> {
	let to = args
		.to
		.as_deref()
		.filter(|to| !to.is_empty())
		.ok_or_else(|| CliError::InvalidInput("--to is required to send a transaction".into()))?;

	Ok(TransactionRequest::new(Address::new(to))
		.with_value(parse_quantity(&args.value)?)
		.with_data(parse_hex_data(&args.data)?)
		.with_gas_price(parse_quantity(&args.gas_price)?)
		.with_gas_limit(parse_quantity(&args.gas_limit)?))
}
