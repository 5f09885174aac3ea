use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	/// Failure already reported on stdout/stderr; exit 1 without printing more.
	#[error("")]
	OutputAlreadyPrinted,

	#[error("config error: {0}")]
	Config(String),

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Session(#[from] pairsign::Error),

	#[error("could not reach relay: {0}")]
	Transport(#[from] pairsign_runtime::Error),

	#[error(transparent)]
	Protocol(#[from] pairsign_protocol::ProtocolError),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	/// Chain rendered as `context: cause`.
	#[error("{0:#}")]
	Anyhow(#[from] anyhow::Error),
}

fn session_error_code(err: &pairsign::Error) -> ErrorCode {
	use pairsign::Error;

	match err {
		Error::NotReady => ErrorCode::TransportUnavailable,
		Error::AlreadyActive | Error::ProposalPending => ErrorCode::SessionBusy,
		Error::NoActiveSession => ErrorCode::NoActiveSession,
		Error::MalformedSession(_) => ErrorCode::MalformedSession,
		Error::MethodNotApproved(_) => ErrorCode::MethodNotApproved,
		Error::InvalidCapabilities(_) => ErrorCode::InvalidInput,
		Error::Encode(_) => ErrorCode::InternalError,
		err if err.is_rejection() => ErrorCode::Rejected,
		err if err.is_timeout() => ErrorCode::Timeout,
		Error::ApprovalTimeout(_) | Error::TransportFailure(_) => ErrorCode::TransportFailure,
	}
}

impl CliError {
	pub fn is_output_already_printed(&self) -> bool {
		matches!(self, CliError::OutputAlreadyPrinted)
	}

	/// Converts to the structured error printed in the result envelope.
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::Config(_) | CliError::InvalidInput(_) | CliError::Protocol(_) => (ErrorCode::InvalidInput, None),
			CliError::Session(err) => {
				let details = match err {
					pairsign::Error::TransportFailure(inner) => inner
						.remote_code()
						.map(|code| serde_json::json!({ "remoteCode": code })),
					pairsign::Error::ApprovalTimeout(limit) => {
						Some(serde_json::json!({ "timeoutSecs": limit.as_secs() }))
					}
					_ => None,
				};
				(session_error_code(err), details)
			}
			CliError::Transport(_) => (ErrorCode::TransportUnavailable, None),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Anyhow(err) if err.downcast_ref::<std::io::Error>().is_some() => (ErrorCode::IoError, None),
			CliError::OutputAlreadyPrinted | CliError::Json(_) | CliError::Anyhow(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn session_errors_map_to_codes() {
		let cases = [
			(pairsign::Error::NotReady, ErrorCode::TransportUnavailable),
			(pairsign::Error::AlreadyActive, ErrorCode::SessionBusy),
			(pairsign::Error::ProposalPending, ErrorCode::SessionBusy),
			(pairsign::Error::NoActiveSession, ErrorCode::NoActiveSession),
			(pairsign::Error::ApprovalTimeout(Duration::from_secs(5)), ErrorCode::Timeout),
			(
				pairsign::Error::MethodNotApproved("personal_sign".into()),
				ErrorCode::MethodNotApproved,
			),
		];

		for (err, code) in cases {
			assert_eq!(CliError::from(err).to_command_error().code, code);
		}
	}

	#[test]
	fn wallet_rejection_carries_remote_code() {
		let err = CliError::from(pairsign::Error::TransportFailure(pairsign_runtime::Error::Remote {
			code: 5000,
			message: "User rejected.".into(),
			data: None,
		}));

		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::Rejected);
		assert_eq!(cmd.details.unwrap()["remoteCode"], 5000);
		assert!(cmd.message.contains("User rejected."));
	}

	#[test]
	fn timeout_details_include_limit() {
		let err = CliError::from(pairsign::Error::ApprovalTimeout(Duration::from_secs(30)));
		assert_eq!(err.to_command_error().details.unwrap()["timeoutSecs"], 30);
	}

	#[test]
	fn config_errors_are_invalid_input() {
		let err = CliError::Config("bad chain".into());
		let cmd = err.to_command_error();
		assert_eq!(cmd.code, ErrorCode::InvalidInput);
		assert_eq!(cmd.message, "config error: bad chain");
	}
}
