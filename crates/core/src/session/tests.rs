use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pairsign_protocol::{CapabilitySet, ChainId, DisconnectReason, ETH_SEND_TRANSACTION, RpcRequest};
use pairsign_runtime::{LoopbackTransport, LoopbackWallet, SessionProposal, TransportClient, TransportEvent};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;

use super::*;
use crate::Headless;
use crate::status::StatusKind;

#[derive(Default)]
struct RecordingSurface {
	presented: Mutex<Vec<String>>,
	dismissed: AtomicUsize,
}

impl ApprovalSurface for RecordingSurface {
	fn present(&self, uri: &str) {
		self.presented.lock().push(uri.to_string());
	}

	fn dismiss(&self) {
		self.dismissed.fetch_add(1, Ordering::SeqCst);
	}
}

/// Loopback wallet whose connect and disconnect can be made to fail.
#[derive(Clone, Default)]
struct FlakyTransport {
	inner: LoopbackTransport,
	fail_connect: Arc<AtomicBool>,
	fail_disconnect: Arc<AtomicBool>,
}

#[async_trait]
impl TransportClient for FlakyTransport {
	async fn connect(&self, required: &CapabilitySet) -> pairsign_runtime::Result<SessionProposal> {
		if self.fail_connect.load(Ordering::SeqCst) {
			return Err(pairsign_runtime::Error::ConnectionFailed("relay unreachable".into()));
		}
		self.inner.connect(required).await
	}

	async fn request(&self, topic: &str, chain_id: &ChainId, request: RpcRequest) -> pairsign_runtime::Result<Value> {
		self.inner.request(topic, chain_id, request).await
	}

	async fn disconnect(&self, topic: &str, reason: &DisconnectReason) -> pairsign_runtime::Result<()> {
		if self.fail_disconnect.load(Ordering::SeqCst) {
			return Err(pairsign_runtime::Error::ChannelClosed);
		}
		self.inner.disconnect(topic, reason).await
	}

	fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
		self.inner.subscribe()
	}
}

fn caps() -> CapabilitySet {
	CapabilitySet::builder()
		.chain(ChainId::parse("eip155:5").unwrap())
		.method(ETH_SEND_TRANSACTION)
		.build()
		.unwrap()
}

fn manager_with<T: TransportClient + 'static>(transport: T) -> (SessionManager, Arc<RecordingSurface>) {
	let surface = Arc::new(RecordingSurface::default());
	let manager = SessionManager::with_transport(transport, Arc::clone(&surface), SessionConfig::default());
	(manager, surface)
}

#[tokio::test]
async fn propose_before_transport_is_not_ready() {
	let manager = SessionManager::new(Headless, SessionConfig::default());
	assert!(!manager.is_ready());
	assert!(matches!(manager.propose(&caps()).await, Err(Error::NotReady)));
	assert_eq!(manager.status(), SessionStatus::Idle);
}

#[tokio::test]
async fn init_transport_runs_once() {
	let manager = SessionManager::new(Headless, SessionConfig::default());
	let transport = LoopbackTransport::default();
	let calls = AtomicUsize::new(0);

	for _ in 0..2 {
		manager
			.init_transport(|| async {
				calls.fetch_add(1, Ordering::SeqCst);
				Ok(transport.clone())
			})
			.await
			.unwrap();
	}

	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert!(manager.is_ready());
	assert!(manager.is_listening());
	assert_eq!(transport.subscriber_count(), 1);
}

#[tokio::test]
async fn failed_init_leaves_manager_not_ready() {
	let manager = SessionManager::new(Headless, SessionConfig::default());
	let result = manager
		.init_transport(|| async {
			Err::<LoopbackTransport, _>(pairsign_runtime::Error::ConnectionFailed("refused".into()))
		})
		.await;

	assert!(matches!(result, Err(Error::TransportFailure(_))));
	assert!(!manager.is_ready());
	assert!(!manager.is_listening());
}

#[tokio::test]
async fn propose_presents_uri_before_approval() {
	let transport = LoopbackTransport::default();
	let (manager, surface) = manager_with(transport.clone());

	let pending = manager.propose(&caps()).await.unwrap();
	assert_eq!(manager.status().kind(), StatusKind::AwaitingApproval);
	assert_eq!(surface.presented.lock().as_slice(), [pending.pairing_uri().to_string()]);
	assert_eq!(surface.dismissed.load(Ordering::SeqCst), 0);

	let session = pending.approved().await.unwrap();
	assert_eq!(surface.dismissed.load(Ordering::SeqCst), 1);
	assert_eq!(manager.active_session(), Some(session));
	assert_eq!(manager.snapshot().generation, 1);
}

#[tokio::test]
async fn second_propose_while_pending_is_refused() {
	let (manager, _surface) = manager_with(LoopbackTransport::default());

	let pending = manager.propose(&caps()).await.unwrap();
	assert!(matches!(manager.propose(&caps()).await, Err(Error::ProposalPending)));
	assert_eq!(manager.status().kind(), StatusKind::AwaitingApproval);
	drop(pending);
}

#[tokio::test]
async fn dropping_pending_returns_to_idle() {
	let (manager, surface) = manager_with(LoopbackTransport::default());

	let pending = manager.propose(&caps()).await.unwrap();
	drop(pending);

	assert_eq!(manager.status(), SessionStatus::Idle);
	assert_eq!(surface.dismissed.load(Ordering::SeqCst), 1);

	// a fresh proposal is accepted afterwards
	let pending = manager.propose(&caps()).await.unwrap();
	assert_eq!(pending.generation(), 2);
	pending.abandon();
	assert_eq!(manager.status(), SessionStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn dropping_propose_mid_connect_returns_to_idle() {
	let transport = LoopbackTransport::new(LoopbackWallet::default().with_connect_delay(Duration::from_secs(5)));
	let (manager, surface) = manager_with(transport);

	let attempt = tokio::time::timeout(Duration::from_secs(1), manager.propose(&caps())).await;
	assert!(attempt.is_err());

	assert_eq!(manager.status(), SessionStatus::Idle);
	assert!(surface.presented.lock().is_empty());
}

#[tokio::test]
async fn connect_failure_is_recorded() {
	let transport = FlakyTransport::default();
	transport.fail_connect.store(true, Ordering::SeqCst);
	let (manager, surface) = manager_with(transport.clone());

	let err = manager.propose(&caps()).await.unwrap_err();
	assert!(matches!(err, Error::TransportFailure(_)));
	assert!(matches!(manager.status(), SessionStatus::Failed(FailureReason::Transport(_))));
	assert!(surface.presented.lock().is_empty());

	// Failed accepts a new proposal
	transport.fail_connect.store(false, Ordering::SeqCst);
	manager.propose(&caps()).await.unwrap().approved().await.unwrap();
	assert!(manager.status().is_active());
}

#[tokio::test]
async fn disconnect_failure_keeps_session_active() {
	let transport = FlakyTransport::default();
	let (manager, _surface) = manager_with(transport.clone());
	manager.propose(&caps()).await.unwrap().approved().await.unwrap();

	transport.fail_disconnect.store(true, Ordering::SeqCst);
	assert!(matches!(manager.disconnect().await, Err(Error::TransportFailure(_))));
	assert!(manager.status().is_active());

	transport.fail_disconnect.store(false, Ordering::SeqCst);
	manager.disconnect().await.unwrap();
	assert_eq!(manager.status(), SessionStatus::Disconnected);
}

#[tokio::test]
async fn disconnect_sends_configured_reason() {
	let transport = LoopbackTransport::default();
	let config = SessionConfig::default().with_disconnect_reason(DisconnectReason::new(6000, "Bye"));
	let manager = SessionManager::with_transport(transport.clone(), Headless, config);

	let session = manager.propose(&caps()).await.unwrap().approved().await.unwrap();
	manager.disconnect().await.unwrap();

	let disconnects = transport.disconnects();
	assert_eq!(disconnects.len(), 1);
	assert_eq!(disconnects[0].topic, session.topic());
	assert_eq!(disconnects[0].reason.message, "Bye");
}

#[tokio::test]
async fn remote_delete_requires_matching_topic() {
	let (manager, _surface) = manager_with(LoopbackTransport::default());
	let session = manager.propose(&caps()).await.unwrap().approved().await.unwrap();

	assert!(!manager.remote_session_deleted(Some("someone-else")));
	assert!(manager.status().is_active());

	assert!(manager.remote_session_deleted(Some(session.topic())));
	assert_eq!(manager.status(), SessionStatus::Disconnected);
	assert!(!manager.remote_session_deleted(Some(session.topic())));
}

#[tokio::test]
async fn topicless_delete_ends_active_session() {
	let (manager, _surface) = manager_with(LoopbackTransport::default());
	manager.propose(&caps()).await.unwrap().approved().await.unwrap();

	assert!(manager.remote_session_deleted(None));
	assert_eq!(manager.status(), SessionStatus::Disconnected);
}

#[tokio::test]
async fn remote_delete_while_pending_is_ignored() {
	let (manager, _surface) = manager_with(LoopbackTransport::default());
	let pending = manager.propose(&caps()).await.unwrap();

	assert!(!manager.remote_session_deleted(None));
	assert_eq!(manager.status().kind(), StatusKind::AwaitingApproval);

	pending.approved().await.unwrap();
	assert!(manager.status().is_active());
}

#[tokio::test]
async fn watch_observes_transitions_in_order() {
	let (manager, _surface) = manager_with(LoopbackTransport::default());
	let mut updates = manager.watch();

	let pending = manager.propose(&caps()).await.unwrap();
	assert!(updates.has_changed().unwrap());
	assert_eq!(updates.borrow_and_update().status.kind(), StatusKind::AwaitingApproval);

	pending.approved().await.unwrap();
	updates.changed().await.unwrap();
	assert_eq!(updates.borrow_and_update().status.kind(), StatusKind::Active);
}

#[tokio::test]
async fn shutdown_disconnects_and_stops_listening() {
	let transport = LoopbackTransport::default();
	let (manager, _surface) = manager_with(transport.clone());
	manager.propose(&caps()).await.unwrap().approved().await.unwrap();

	manager.shutdown().await.unwrap();
	assert_eq!(manager.status(), SessionStatus::Disconnected);
	assert!(!manager.is_listening());
	assert!(transport.active_topics().is_empty());
}
