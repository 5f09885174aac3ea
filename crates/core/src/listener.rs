//! Background task turning transport lifecycle signals into transitions.

use std::sync::Weak;

use pairsign_runtime::TransportEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::session::Shared;

/// Owns the subscription to a transport's event channel.
///
/// Holds the manager state weakly; the task ends when the manager is gone or
/// the transport closes its channel, and is aborted on drop.
pub(crate) struct EventListener {
	task: JoinHandle<()>,
}

impl EventListener {
	pub(crate) fn spawn(shared: Weak<Shared>, events: broadcast::Receiver<TransportEvent>) -> Self {
		Self {
			task: tokio::spawn(run(shared, events)),
		}
	}
}

impl Drop for EventListener {
	fn drop(&mut self) {
		self.task.abort();
	}
}

async fn run(shared: Weak<Shared>, mut events: broadcast::Receiver<TransportEvent>) {
	loop {
		let event = match events.recv().await {
			Ok(event) => event,
			Err(RecvError::Lagged(skipped)) => {
				warn!(target = "pairsign.session", skipped, "event listener lagged, signals dropped");
				continue;
			}
			Err(RecvError::Closed) => {
				debug!(target = "pairsign.session", "transport event channel closed");
				break;
			}
		};

		let Some(shared) = shared.upgrade() else {
			break;
		};
		handle(&shared, event);
	}
}

fn handle(shared: &Shared, event: TransportEvent) {
	if event.is_termination() {
		shared.remote_terminated(event.topic());
		return;
	}
	debug!(
		target = "pairsign.session",
		event = event.name(),
		topic = ?event.topic(),
		"ignoring transport event"
	);
}
