pub mod config;
pub mod flow;
pub mod session;
pub mod shell;

use serde::Serialize;

use crate::cli::{Cli, Commands, ConfigAction};
use crate::config::{Settings, default_config_path};
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, ResultBuilder, TextOutput, print_error_stderr, print_result};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let format = cli.format;

	if let Commands::Config {
		action: ConfigAction::Init { force },
	} = cli.command
	{
		let path = cli.config.unwrap_or_else(default_config_path);
		return config::init(&path, force, format);
	}

	let settings = Settings::load(cli.config.as_deref(), &cli.overrides)?;
	match cli.command {
		Commands::Shell => shell::run(&settings, format).await,
		Commands::Flow { no_send, tx } => flow::run(&settings, (!no_send).then_some(tx), format).await,
		Commands::Config { .. } => config::show(&settings, format),
	}
}

/// Prints the outcome of one command.
///
/// Failures go to stderr and, for machine formats, into the stdout envelope;
/// the returned error is then [`CliError::OutputAlreadyPrinted`].
pub fn report<T: Serialize + TextOutput>(builder: ResultBuilder<T>, outcome: Result<T>, format: OutputFormat) -> Result<()> {
	match outcome {
		Ok(data) => {
			print_result(&builder.data(data).build(), format);
			Ok(())
		}
		Err(err) if err.is_output_already_printed() => Err(err),
		Err(err) => {
			let error = err.to_command_error();
			print_error_stderr(&error);
			if format != OutputFormat::Text {
				print_result(&builder.error(error).build(), format);
			}
			Err(CliError::OutputAlreadyPrinted)
		}
	}
}
