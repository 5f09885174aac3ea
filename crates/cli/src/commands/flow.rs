//! One-shot `flow`: connect, optionally send, disconnect.

use tracing::info;

use super::report;
use super::session::{SessionContext, build_transaction};
use crate::cli::TxArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::output::{FlowData, OutputFormat, ResultBuilder};

pub async fn run(settings: &Settings, tx: Option<TxArgs>, format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::new("flow");
	let outcome = execute(settings, tx.as_ref()).await;
	report(builder, outcome, format)
}

async fn execute(settings: &Settings, tx: Option<&TxArgs>) -> Result<FlowData> {
	// validate before bothering the wallet
	let transaction = tx.map(build_transaction).transpose()?;

	let ctx = SessionContext::open(settings).await?;
	let connected = ctx.connect().await?;
	info!(target = "pairsign", address = ?connected.address, "paired");

	let sent = match transaction {
		Some(tx) => match ctx.send_transaction(tx).await {
			Ok(sent) => Some(sent),
			Err(err) => {
				ctx.shutdown().await;
				return Err(err);
			}
		},
		None => None,
	};

	let disconnected = ctx.disconnect().await?;
	Ok(FlowData {
		connected,
		sent,
		disconnected,
	})
}
