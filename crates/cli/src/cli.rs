use std::path::PathBuf;

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;
use crate::transport::TransportKind;

fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser, Debug)]
#[command(name = "pairsign")]
#[command(about = "Pair with a wallet and send transactions through it")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default), json, or ndjson
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Config file (defaults to $XDG_CONFIG_HOME/pairsign/config.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(flatten)]
	pub overrides: Overrides,

	#[command(subcommand)]
	pub command: Commands,
}

impl Cli {
	/// Name used in the result envelope.
	pub fn command_name(&self) -> &'static str {
		match self.command {
			Commands::Shell => "shell",
			Commands::Flow { .. } => "flow",
			Commands::Config { .. } => "config",
		}
	}
}

/// Flags that override config file values.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
	/// Relay bridge endpoint (ws:// or wss://)
	#[arg(long, global = true, value_name = "URL")]
	pub relay_url: Option<String>,

	/// Project id sent to the relay (falls back to PAIRSIGN_PROJECT_ID)
	#[arg(long, global = true, value_name = "ID")]
	pub project_id: Option<String>,

	/// Chain to request, as a CAIP-2 id
	#[arg(long, global = true, value_name = "CHAIN_ID")]
	pub chain: Option<String>,

	/// Transport to use
	#[arg(long, global = true, value_enum)]
	pub transport: Option<TransportKind>,

	/// Seconds to wait for the wallet to approve (0 waits forever)
	#[arg(long, global = true, value_name = "SECS")]
	pub approval_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Interactive session: connect, send, status, disconnect, quit
	Shell,

	/// Connect, optionally send one transaction, then disconnect
	Flow {
		/// Skip the transaction and only pair
		#[arg(long)]
		no_send: bool,

		#[command(flatten)]
		tx: TxArgs,
	},

	/// Inspect or create the config file
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
	/// Print the effective settings after applying flags
	Show,
	/// Write a config file with default values
	Init {
		/// Overwrite an existing file
		#[arg(long)]
		force: bool,
	},
}

/// Transaction fields. Quantities accept decimal or 0x-prefixed hex.
#[derive(Args, Debug, Clone)]
pub struct TxArgs {
	/// Recipient address
	#[arg(long, value_name = "ADDRESS")]
	pub to: Option<String>,

	/// Value in wei
	#[arg(long, default_value = "0")]
	pub value: String,

	/// Call data as 0x-prefixed hex
	#[arg(long, default_value = "0x")]
	pub data: String,

	#[arg(long, default_value = "0x029104e28c")]
	pub gas_price: String,

	#[arg(long, default_value = "0x5208")]
	pub gas_limit: String,
}

/// One line typed into `shell`.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
pub struct ShellLine {
	#[command(subcommand)]
	pub command: ShellCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
	/// Propose a session and wait for approval
	Connect,
	/// Send a transaction over the active session
	Send(TxArgs),
	/// End the active session
	Disconnect,
	/// Show status, active address and last transaction
	Status,
	/// End the session and exit
	#[command(alias = "exit")]
	Quit,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_global_overrides() {
		let cli = Cli::try_parse_from([
			"pairsign",
			"-vv",
			"-f",
			"json",
			"--transport",
			"loopback",
			"--chain",
			"eip155:1",
			"flow",
			"--to",
			"0xDEAD",
		])
		.unwrap();

		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Json);
		assert_eq!(cli.overrides.transport, Some(TransportKind::Loopback));
		assert_eq!(cli.overrides.chain.as_deref(), Some("eip155:1"));
		match cli.command {
			Commands::Flow { no_send, tx } => {
				assert!(!no_send);
				assert_eq!(tx.to.as_deref(), Some("0xDEAD"));
				assert_eq!(tx.gas_limit, "0x5208");
			}
			other => panic!("expected flow, got {other:?}"),
		}
	}

	#[test]
	fn shell_lines_parse_without_binary_name() {
		let line = ShellLine::try_parse_from("send --to 0xBEEF --value 10".split_whitespace()).unwrap();
		match line.command {
			ShellCommand::Send(tx) => {
				assert_eq!(tx.to.as_deref(), Some("0xBEEF"));
				assert_eq!(tx.value, "10");
			}
			other => panic!("expected send, got {other:?}"),
		}

		let quit = ShellLine::try_parse_from(["exit"]).unwrap();
		assert!(matches!(quit.command, ShellCommand::Quit));
		assert!(ShellLine::try_parse_from(["launch"]).is_err());
	}
}
