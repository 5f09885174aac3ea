//! Interactive `shell`: one manager, many commands, read line by line.

use std::io::{IsTerminal, Write};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::report;
use super::session::SessionContext;
use crate::cli::{ShellCommand, ShellLine};
use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, ResultBuilder, StatusData, print_error_stderr};

pub async fn run(settings: &Settings, format: OutputFormat) -> Result<()> {
	let ctx = SessionContext::open(settings).await?;
	let interactive = std::io::stdin().is_terminal();
	let mut lines = BufReader::new(tokio::io::stdin()).lines();

	loop {
		if interactive {
			let mut stderr = std::io::stderr().lock();
			let _ = write!(stderr, "pairsign> ");
			let _ = stderr.flush();
		}

		let Some(line) = lines.next_line().await? else {
			break;
		};
		let line = line.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}

		let command = match ShellLine::try_parse_from(line.split_whitespace()) {
			Ok(parsed) => parsed.command,
			Err(err) => {
				print_error_stderr(&CliError::InvalidInput(err.to_string().trim_end().to_string()).to_command_error());
				continue;
			}
		};

		if matches!(command, ShellCommand::Quit) {
			break;
		}
		// failures are already printed; keep reading
		let _ = execute(&ctx, command, format).await;
	}

	debug!(target = "pairsign", "shell closing");
	ctx.shutdown().await;
	Ok(())
}

async fn execute(ctx: &SessionContext, command: ShellCommand, format: OutputFormat) -> Result<()> {
	match command {
		ShellCommand::Connect => {
			let builder = ResultBuilder::new("connect");
			report(builder, ctx.connect().await, format)
		}
		ShellCommand::Send(args) => {
			let builder = ResultBuilder::new("send");
			report(builder, ctx.send(&args).await, format)
		}
		ShellCommand::Disconnect => {
			let builder = ResultBuilder::new("disconnect");
			report(builder, ctx.disconnect().await, format)
		}
		ShellCommand::Status | ShellCommand::Quit => {
			let builder = ResultBuilder::<StatusData>::new("status");
			report(builder, Ok(ctx.status()), format)
		}
	}
}
