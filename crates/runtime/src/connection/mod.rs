//! JSON-RPC plumbing between a transport's socket tasks and its callers.
//!
//! [`Connection::call`] assigns the next sequential id, parks a oneshot
//! sender under it and queues the frame for the writer task. The reader task
//! feeds every inbound frame to [`Connection::dispatch_value`]: frames with an
//! `id` complete the parked request, `{event, params}` frames are decoded into
//! [`TransportEvent`]s and broadcast.
//!
//! Dropping a [`ResponseFuture`] before its reply arrives removes the pending
//! callback, so a late reply is discarded instead of resolving anything.
//! Once [`Connection::close`] has run, new calls fail with
//! [`Error::ChannelClosed`] instead of parking forever.

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{Error, Result};
use crate::transport::TransportEvent;

/// Outbound JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	pub jsonrpc: String,
	pub id: u32,
	pub method: String,
	pub params: Value,
}

/// Inbound JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	pub id: u32,
	/// Absent when `error` is set.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Unsolicited notification pushed by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
	pub event: String,
	#[serde(default)]
	pub params: Value,
}

/// Discriminated union of inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	Response(Response),
	Notification(Notification),
	/// Anything else the bridge sends; ignored.
	Unknown(Value),
}

type CallbackMap = Arc<Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// Removes the parked sender if the request future is dropped unanswered.
struct CancelGuard {
	id: u32,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: u32, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		if self.callbacks.lock().remove(&self.id).is_some() {
			tracing::debug!(target = "pairsign.relay", id = self.id, "request abandoned before reply");
		}
	}
}

/// Future returned by [`Connection::call`] with automatic cancellation cleanup.
pub struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// JSON-RPC connection to the relay bridge.
///
/// Uses sequential request IDs and oneshot channels for correlation. The
/// socket itself is driven by tasks owned by the transport; the connection
/// only sees JSON values.
pub struct Connection {
	last_id: AtomicU32,
	callbacks: CallbackMap,
	/// Drained by the socket writer task.
	outbound_tx: mpsc::UnboundedSender<Value>,
	events: broadcast::Sender<TransportEvent>,
	closed: AtomicBool,
}

impl Connection {
	pub fn new(outbound_tx: mpsc::UnboundedSender<Value>, events: broadcast::Sender<TransportEvent>) -> Self {
		Self {
			last_id: AtomicU32::new(0),
			callbacks: Arc::new(Mutex::new(HashMap::new())),
			outbound_tx,
			events,
			closed: AtomicBool::new(false),
		}
	}

	/// Queues a request and returns the future resolving to its reply.
	///
	/// The returned future does not borrow the connection.
	pub fn call(&self, method: &str, params: Value) -> Result<ResponseFuture> {
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);

		tracing::debug!(target = "pairsign.relay", id, method, "request queued");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().insert(id, tx);

		// close() may have drained the map between the check above and the insert
		if self.is_closed() {
			self.callbacks.lock().remove(&id);
			return Err(Error::ChannelClosed);
		}

		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		let request = Request {
			jsonrpc: "2.0".to_string(),
			id,
			method: method.to_string(),
			params,
		};

		let frame = serde_json::to_value(&request)?;
		if self.outbound_tx.send(frame).is_err() {
			tracing::warn!(target = "pairsign.relay", id, method, "socket writer gone, request not sent");
			return Err(Error::ChannelClosed);
		}

		Ok(ResponseFuture { rx, guard })
	}

	/// Sends a request and awaits its reply.
	pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
		self.call(method, params)?.await
	}

	/// Parses and dispatches one inbound frame, logging anything unusable.
	pub fn dispatch_value(&self, value: Value) {
		match serde_json::from_value::<Message>(value) {
			Ok(message) => {
				if let Err(err) = self.dispatch(message) {
					tracing::warn!(target = "pairsign.relay", error = %err, "inbound frame dropped");
				}
			}
			Err(err) => tracing::warn!(target = "pairsign.relay", error = %err, "unparsable inbound frame"),
		}
	}

	pub fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let callback = self
					.callbacks
					.lock()
					.remove(&response.id)
					.ok_or_else(|| Error::ProtocolError(format!("Cannot find request to respond: id={}", response.id)))?;

				let result = match response.error {
					Some(error) => Err(Error::Remote {
						code: error.code,
						message: error.message,
						data: error.data,
					}),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				let _ = callback.send(result);
				Ok(())
			}
			Message::Notification(notification) => {
				let event = TransportEvent::from_wire(&notification.event, notification.params);
				tracing::debug!(target = "pairsign.relay", event = event.name(), topic = ?event.topic(), "notification");
				// no subscribers is fine; nothing is listening yet
				let _ = self.events.send(event);
				Ok(())
			}
			Message::Unknown(value) => {
				tracing::debug!(target = "pairsign.relay", frame = %value, "ignoring unrecognized frame");
				Ok(())
			}
		}
	}

	/// Fails every pending request with [`Error::ChannelClosed`] and refuses
	/// new ones.
	pub fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
		let pending: Vec<_> = self.callbacks.lock().drain().collect();
		if !pending.is_empty() {
			tracing::debug!(target = "pairsign.relay", count = pending.len(), "connection closed with requests in flight");
		}
		for (_, callback) in pending {
			let _ = callback.send(Err(Error::ChannelClosed));
		}
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Number of requests still awaiting a reply.
	pub fn pending(&self) -> usize {
		self.callbacks.lock().len()
	}
}
