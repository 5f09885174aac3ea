//! Result envelope printed by every command.
//!
//! ```json
//! {
//!   "schemaVersion": 1,
//!   "ok": true,
//!   "command": "connect",
//!   "data": { "status": "active", "address": "0x5A0b..." },
//!   "timings": { "durationMs": 812 }
//! }
//! ```
//!
//! Failures replace `data` with `error: { code, message, details }`.

#[cfg(test)]
mod tests;

use std::io::{self, Write};
use std::time::{Duration, Instant};

use colored::Colorize;
use pairsign::{Address, ChainId, SessionView, StatusKind, TxHash};
use serde::{Deserialize, Serialize};

/// Bumped on breaking changes to the envelope.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Pretty-printed JSON
	Json,
	/// One JSON object per line
	Ndjson,
	/// Human-readable text
	#[default]
	Text,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub schema_version: Option<u32>,

	pub ok: bool,

	/// Command name (e.g. "connect", "send")
	pub command: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Stable codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Transport not initialized or relay unreachable
	TransportUnavailable,
	/// A session is already active or a proposal is pending
	SessionBusy,
	/// Operation needs an active session
	NoActiveSession,
	/// Wallet user declined
	Rejected,
	/// Approval or request timed out
	Timeout,
	/// Wallet approved an unusable session
	MalformedSession,
	/// Method not part of the approved capabilities
	MethodNotApproved,
	/// Request failed in the transport or wallet
	TransportFailure,
	/// Bad flag, config value or transaction field
	InvalidInput,
	IoError,
	InternalError,
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let code = match self {
			ErrorCode::TransportUnavailable => "TRANSPORT_UNAVAILABLE",
			ErrorCode::SessionBusy => "SESSION_BUSY",
			ErrorCode::NoActiveSession => "NO_ACTIVE_SESSION",
			ErrorCode::Rejected => "REJECTED",
			ErrorCode::Timeout => "TIMEOUT",
			ErrorCode::MalformedSession => "MALFORMED_SESSION",
			ErrorCode::MethodNotApproved => "METHOD_NOT_APPROVED",
			ErrorCode::TransportFailure => "TRANSPORT_FAILURE",
			ErrorCode::InvalidInput => "INVALID_INPUT",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		};
		f.write_str(code)
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

/// Builds a [`CommandResult`], timing from construction to [`build`](Self::build).
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		CommandResult {
			schema_version: Some(SCHEMA_VERSION),
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
		}
	}
}

/// Renders data for the text format.
pub trait TextOutput {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// Prints a result to stdout in `format`.
pub fn print_result<T: Serialize + TextOutput>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Ndjson => {
			if let Ok(json) = serde_json::to_string(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			let mut stdout = io::stdout().lock();
			let _ = print_result_text(result, &mut stdout);
		}
	}
}

fn print_result_text<T: Serialize + TextOutput>(result: &CommandResult<T>, out: &mut dyn Write) -> io::Result<()> {
	if let Some(data) = &result.data {
		data.render_text(out)?;
	} else if let Some(error) = &result.error {
		writeln!(out, "Error [{}]: {}", error.code, error.message)?;
	}
	Ok(())
}

/// Prints an error to stderr in human-readable form.
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("{} [{}]: {}", "Error".red().bold(), error.code, error.message);
}

/// Session state as shown by `status` and returned by most commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
	pub status: StatusKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub topic: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<ChainId>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_tx: Option<TxHash>,
	/// Block-explorer link for `last_tx`, when an explorer is configured.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<String>,
}

impl StatusData {
	pub fn from_view(view: SessionView, explorer: Option<&url::Url>) -> Self {
		let explorer_url = match (explorer, &view.last_tx) {
			(Some(base), Some(tx)) => explorer_link(base, tx),
			_ => None,
		};
		Self {
			status: view.status,
			reason: view.reason,
			topic: view.topic,
			chain_id: view.chain_id,
			address: view.address,
			last_tx: view.last_tx,
			explorer_url,
		}
	}
}

/// Appends `tx` to the explorer base URL.
pub fn explorer_link(base: &url::Url, tx: &TxHash) -> Option<String> {
	base.join(tx.as_str()).ok().map(String::from)
}

fn status_label(status: StatusKind) -> colored::ColoredString {
	let label = status.to_string();
	match status {
		StatusKind::Active => label.green().bold(),
		StatusKind::Failed => label.red().bold(),
		StatusKind::Proposing | StatusKind::AwaitingApproval => label.yellow(),
		StatusKind::Idle | StatusKind::Disconnected => label.dimmed(),
	}
}

impl TextOutput for StatusData {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()> {
		writeln!(out, "status:   {}", status_label(self.status))?;
		if let Some(reason) = &self.reason {
			writeln!(out, "reason:   {reason}")?;
		}
		if let Some(address) = &self.address {
			writeln!(out, "address:  {address}")?;
		}
		if let Some(chain) = &self.chain_id {
			writeln!(out, "chain:    {chain}")?;
		}
		if let Some(topic) = &self.topic {
			writeln!(out, "topic:    {topic}")?;
		}
		if let Some(tx) = &self.last_tx {
			writeln!(out, "last tx:  {tx}")?;
		}
		if let Some(link) = &self.explorer_url {
			writeln!(out, "explorer: {link}")?;
		}
		Ok(())
	}
}

/// Result of `send`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendData {
	pub tx_hash: TxHash,
	pub from: Address,
	pub to: Address,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<String>,
}

impl TextOutput for SendData {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()> {
		writeln!(out, "sent {} ({} -> {})", self.tx_hash.as_str().bold(), self.from, self.to)?;
		if let Some(link) = &self.explorer_url {
			writeln!(out, "explorer: {link}")?;
		}
		Ok(())
	}
}

/// Result of `flow`: every step that ran.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowData {
	pub connected: StatusData,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub sent: Option<SendData>,
	pub disconnected: StatusData,
}

impl TextOutput for FlowData {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()> {
		self.connected.render_text(out)?;
		if let Some(sent) = &self.sent {
			sent.render_text(out)?;
		}
		writeln!(out, "status:   {}", status_label(self.disconnected.status))
	}
}

impl TextOutput for serde_json::Value {
	fn render_text(&self, out: &mut dyn Write) -> io::Result<()> {
		let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
		writeln!(out, "{json}")
	}
}

impl TextOutput for () {
	fn render_text(&self, _out: &mut dyn Write) -> io::Result<()> {
		Ok(())
	}
}
