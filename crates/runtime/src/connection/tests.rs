use std::sync::atomic::Ordering;

use serde_json::json;
use tokio::sync::{broadcast, mpsc};

use super::*;

fn create_test_connection() -> (Connection, mpsc::UnboundedReceiver<Value>, broadcast::Receiver<TransportEvent>) {
	let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
	let (events, events_rx) = broadcast::channel(16);
	(Connection::new(outbound_tx, events), outbound_rx, events_rx)
}

#[test]
fn test_request_id_increments() {
	let (connection, _outbound, _) = create_test_connection();

	let id1 = connection.last_id.fetch_add(1, Ordering::SeqCst);
	let id2 = connection.last_id.fetch_add(1, Ordering::SeqCst);
	let id3 = connection.last_id.fetch_add(1, Ordering::SeqCst);

	assert_eq!(id1, 0);
	assert_eq!(id2, 1);
	assert_eq!(id3, 2);
}

#[tokio::test]
async fn test_call_queues_request_frame() {
	let (connection, mut outbound, _) = create_test_connection();

	let _pending = connection.call("pairing_connect", json!({"requiredNamespaces": {}})).unwrap();

	let frame = outbound.recv().await.unwrap();
	assert_eq!(frame["jsonrpc"], "2.0");
	assert_eq!(frame["id"], 0);
	assert_eq!(frame["method"], "pairing_connect");
	assert_eq!(connection.pending(), 1);
}

#[tokio::test]
async fn test_dispatch_response_success() {
	let (connection, _outbound, _) = create_test_connection();

	let pending = connection.call("session_request", json!({})).unwrap();

	connection
		.dispatch(Message::Response(Response {
			id: 0,
			result: Some(json!("0xabc")),
			error: None,
		}))
		.unwrap();

	assert_eq!(pending.await.unwrap(), json!("0xabc"));
	assert_eq!(connection.pending(), 0);
}

#[tokio::test]
async fn test_dispatch_response_error() {
	let (connection, _outbound, _) = create_test_connection();

	let pending = connection.call("session_request", json!({})).unwrap();

	connection
		.dispatch(Message::Response(Response {
			id: 0,
			result: None,
			error: Some(ErrorPayload {
				code: 5000,
				message: "User rejected.".to_string(),
				data: None,
			}),
		}))
		.unwrap();

	let err = pending.await.unwrap_err();
	assert!(err.is_rejection(), "Expected rejection, got: {err:?}");
}

#[test]
fn test_response_for_unknown_id_is_protocol_error() {
	let (connection, _outbound, _) = create_test_connection();

	let result = connection.dispatch(Message::Response(Response {
		id: 99,
		result: None,
		error: None,
	}));

	assert!(matches!(result, Err(Error::ProtocolError(_))));
}

#[tokio::test]
async fn test_dropped_future_releases_callback() {
	let (connection, _outbound, _) = create_test_connection();

	let pending = connection.call("pairing_approval", json!({"proposalId": 1})).unwrap();
	assert_eq!(connection.pending(), 1);

	drop(pending);
	assert_eq!(connection.pending(), 0);

	// late reply for the abandoned request is reported, not delivered
	let late = connection.dispatch(Message::Response(Response {
		id: 0,
		result: Some(json!({"topic": "t1"})),
		error: None,
	}));
	assert!(late.is_err());
}

#[tokio::test]
async fn test_close_fails_pending_requests() {
	let (connection, _outbound, _) = create_test_connection();

	let pending = connection.call("pairing_approval", json!({})).unwrap();
	connection.close();

	assert!(matches!(pending.await, Err(Error::ChannelClosed)));
}

#[tokio::test]
async fn test_call_after_close_fails_immediately() {
	let (connection, mut outbound, _) = create_test_connection();

	connection.close();
	assert!(connection.is_closed());

	let result = connection.call("session_request", json!({"topic": "t1"}));
	assert!(matches!(result, Err(Error::ChannelClosed)));
	assert_eq!(connection.pending(), 0);
	assert!(outbound.try_recv().is_err(), "closed connection queued a frame");

	let result = connection.send_message("session_disconnect", json!({"topic": "t1"})).await;
	assert!(matches!(result, Err(Error::ChannelClosed)));
}

#[tokio::test]
async fn test_notification_is_broadcast() {
	let (connection, _, mut events) = create_test_connection();

	connection.dispatch_value(json!({"event": "session_delete", "params": {"topic": "t1"}}));

	let event = events.recv().await.unwrap();
	assert_eq!(event, TransportEvent::SessionDeleted { topic: Some("t1".into()) });
}

#[test]
fn test_message_deserialization_response() {
	let json = r#"{"id": 42, "result": {"uri": "wc:abc@2"}}"#;
	let message: Message = serde_json::from_str(json).unwrap();

	match message {
		Message::Response(response) => {
			assert_eq!(response.id, 42);
			assert!(response.result.is_some());
			assert!(response.error.is_none());
		}
		_ => panic!("Expected Response"),
	}
}

#[test]
fn test_message_deserialization_notification() {
	let json = r#"{"event": "session_expire", "params": {"topic": "t9"}}"#;
	let message: Message = serde_json::from_str(json).unwrap();

	match message {
		Message::Notification(notification) => {
			assert_eq!(notification.event, "session_expire");
			assert_eq!(notification.params["topic"], "t9");
		}
		_ => panic!("Expected Notification"),
	}
}

#[test]
fn test_message_deserialization_unknown() {
	let message: Message = serde_json::from_str(r#"{"hello": "world"}"#).unwrap();
	assert!(matches!(message, Message::Unknown(_)));
}
