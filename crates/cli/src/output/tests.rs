use pairsign::SessionSnapshot;

use super::*;

fn active_view() -> SessionView {
	SessionView {
		status: StatusKind::Active,
		reason: None,
		topic: Some("t1".into()),
		chain_id: Some(ChainId::parse("eip155:5").unwrap()),
		address: Some(Address::new("0xDEAD")),
		last_tx: Some(TxHash::new("0xabc123")),
	}
}

#[test]
fn result_builder_success() {
	let result: CommandResult<StatusData> = ResultBuilder::new("status")
		.data(StatusData::from_view(active_view(), None))
		.build();

	assert!(result.ok);
	assert_eq!(result.command, "status");
	assert_eq!(result.schema_version, Some(SCHEMA_VERSION));
	assert!(result.timings.is_some());
	assert!(result.error.is_none());
}

#[test]
fn result_builder_error() {
	let result: CommandResult<StatusData> = ResultBuilder::new("send")
		.error(CommandError {
			code: ErrorCode::NoActiveSession,
			message: "no active session".into(),
			details: None,
		})
		.build();

	assert!(!result.ok);
	assert!(result.data.is_none());
	assert_eq!(result.error.as_ref().unwrap().code, ErrorCode::NoActiveSession);
}

#[test]
fn error_code_display_matches_serde() {
	for code in [ErrorCode::NoActiveSession, ErrorCode::MethodNotApproved, ErrorCode::Timeout] {
		let json = serde_json::to_value(code).unwrap();
		assert_eq!(json, code.to_string());
	}
	assert_eq!(ErrorCode::TransportUnavailable.to_string(), "TRANSPORT_UNAVAILABLE");
}

#[test]
fn explorer_link_joins_hash() {
	let base = url::Url::parse("https://goerli.etherscan.io/tx/").unwrap();
	let data = StatusData::from_view(active_view(), Some(&base));
	assert_eq!(data.explorer_url.as_deref(), Some("https://goerli.etherscan.io/tx/0xabc123"));

	let idle = StatusData::from_view(SessionSnapshot::default().view(), Some(&base));
	assert!(idle.explorer_url.is_none());
}

#[test]
fn serialize_status_result() {
	let result: CommandResult<StatusData> = ResultBuilder::new("status")
		.data(StatusData::from_view(active_view(), None))
		.build();

	let json = serde_json::to_value(&result).unwrap();
	assert_eq!(json["ok"], true);
	assert_eq!(json["data"]["status"], "active");
	assert_eq!(json["data"]["address"], "0xDEAD");
	assert_eq!(json["data"]["lastTx"], "0xabc123");
	assert!(json["data"].get("explorerUrl").is_none());
	assert!(json["timings"]["durationMs"].is_u64());
}

#[test]
fn text_output_lists_fields() {
	colored::control::set_override(false);
	let data = StatusData::from_view(active_view(), None);

	let mut buf = Vec::new();
	data.render_text(&mut buf).unwrap();
	let text = String::from_utf8(buf).unwrap();

	assert!(text.contains("status:   active"));
	assert!(text.contains("address:  0xDEAD"));
	assert!(text.contains("last tx:  0xabc123"));
	assert!(!text.contains("reason"));
}

#[test]
fn text_output_for_errors() {
	let result: CommandResult<StatusData> = ResultBuilder::new("connect")
		.error(CommandError {
			code: ErrorCode::Rejected,
			message: "rejected by wallet".into(),
			details: None,
		})
		.build();

	let mut buf = Vec::new();
	print_result_text(&result, &mut buf).unwrap();
	assert_eq!(String::from_utf8(buf).unwrap(), "Error [REJECTED]: rejected by wallet\n");
}
