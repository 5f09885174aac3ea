//! Session lifecycle: proposal, approval, activation and teardown.
//!
//! [`SessionManager`] owns the single [`SessionStatus`] of a dapp. Every
//! transition happens under one lock and is published on a watch channel, so
//! display layers observe the same sequence the manager applied.
//!
//! ```text
//! Idle ──propose──▶ Proposing ──uri──▶ AwaitingApproval ──approved──▶ Active
//!   ▲                                         │                         │
//!   └──────────── abandon ◀───────────────────┤                         │
//!                                   rejected / timeout / malformed      │
//!                                             ▼                         ▼
//!                                          Failed              Disconnected
//! ```
//!
//! `Failed` and `Disconnected` accept a new proposal.

mod pending;

use std::future::Future;
use std::sync::Arc;

use pairsign_protocol::{Address, CapabilitySet, TxHash};
use pairsign_runtime::TransportClient;
use parking_lot::Mutex;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

pub use pending::PendingSession;

use crate::approval::ApprovalSurface;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::listener::EventListener;
use crate::status::{ActiveSession, FailureReason, SessionSnapshot, SessionStatus, SessionView};

/// State shared by the manager, its pending proposals and the event listener.
pub(crate) struct Shared {
	state: Mutex<SessionSnapshot>,
	updates: watch::Sender<SessionSnapshot>,
	transport: OnceCell<Arc<dyn TransportClient>>,
	listener: Mutex<Option<EventListener>>,
	pub(crate) surface: Arc<dyn ApprovalSurface>,
	pub(crate) config: SessionConfig,
}

impl Shared {
	pub(crate) fn snapshot(&self) -> SessionSnapshot {
		self.state.lock().clone()
	}

	pub(crate) fn transport(&self) -> Option<Arc<dyn TransportClient>> {
		self.transport.get().cloned()
	}

	pub(crate) fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
		self.updates.subscribe()
	}

	/// Applies `apply` under the state lock and publishes the result when it
	/// reports a change.
	pub(crate) fn transition(&self, apply: impl FnOnce(&mut SessionSnapshot) -> bool) -> bool {
		let mut state = self.state.lock();
		let from = state.status.kind();
		if !apply(&mut state) {
			return false;
		}
		debug!(
			target = "pairsign.session",
			from = %from,
			to = %state.status.kind(),
			generation = state.generation,
			"session transition"
		);
		self.updates.send_replace(state.clone());
		true
	}

	/// Transition that only applies while `generation` is still current and
	/// the status is one of the pending states.
	pub(crate) fn settle_pending(&self, generation: u64, status: SessionStatus) -> bool {
		self.transition(|snap| {
			if snap.generation != generation || !snap.status.is_pending() {
				return false;
			}
			if status.is_active() {
				snap.last_tx = None;
			}
			snap.status = status;
			true
		})
	}

	/// Ends the active session if it is the one named by `topic`.
	///
	/// A missing topic matches whatever session is active.
	pub(crate) fn remote_terminated(&self, topic: Option<&str>) -> bool {
		let ended = self.transition(|snap| {
			let matches = snap
				.status
				.active()
				.is_some_and(|session| topic.is_none_or(|t| t == session.topic()));
			if matches {
				snap.status = SessionStatus::Disconnected;
			}
			matches
		});

		if ended {
			info!(target = "pairsign.session", topic = ?topic, "session ended by wallet");
		} else {
			debug!(target = "pairsign.session", topic = ?topic, "remote termination ignored");
		}
		ended
	}

	fn attach_listener(self: &Arc<Self>, transport: &dyn TransportClient) -> bool {
		let mut slot = self.listener.lock();
		if slot.is_some() {
			warn!(target = "pairsign.session", "event listener already attached");
			return false;
		}
		*slot = Some(EventListener::spawn(Arc::downgrade(self), transport.subscribe()));
		true
	}

	fn detach_listener(&self) -> Option<EventListener> {
		self.listener.lock().take()
	}
}

/// Drives one dapp-to-wallet session at a time.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
	pub(crate) shared: Arc<Shared>,
}

impl SessionManager {
	/// Creates a manager whose transport is supplied later through
	/// [`init_transport`](Self::init_transport). Until then `propose` fails
	/// with [`Error::NotReady`].
	pub fn new(surface: impl ApprovalSurface + 'static, config: SessionConfig) -> Self {
		Self::from_parts(OnceCell::new(), Arc::new(surface), config)
	}

	/// Creates a manager around an initialized transport.
	///
	/// Must be called within a Tokio runtime: the event listener is spawned
	/// immediately.
	pub fn with_transport<T>(transport: T, surface: impl ApprovalSurface + 'static, config: SessionConfig) -> Self
	where
		T: TransportClient + 'static,
	{
		let transport: Arc<dyn TransportClient> = Arc::new(transport);
		let manager = Self::from_parts(OnceCell::new_with(Some(Arc::clone(&transport))), Arc::new(surface), config);
		manager.shared.attach_listener(transport.as_ref());
		manager
	}

	fn from_parts(
		transport: OnceCell<Arc<dyn TransportClient>>,
		surface: Arc<dyn ApprovalSurface>,
		config: SessionConfig,
	) -> Self {
		let initial = SessionSnapshot::default();
		let (updates, _) = watch::channel(initial.clone());
		Self {
			shared: Arc::new(Shared {
				state: Mutex::new(initial),
				updates,
				transport,
				listener: Mutex::new(None),
				surface,
				config,
			}),
		}
	}

	/// Initializes the transport once and attaches the event listener to it.
	///
	/// Later calls return immediately without running `init`, so the
	/// transport is subscribed to exactly once.
	pub async fn init_transport<T, F, Fut>(&self, init: F) -> Result<()>
	where
		T: TransportClient + 'static,
		F: FnOnce() -> Fut,
		Fut: Future<Output = pairsign_runtime::Result<T>>,
	{
		let shared = &self.shared;
		shared
			.transport
			.get_or_try_init(|| async {
				let transport: Arc<dyn TransportClient> = Arc::new(init().await?);
				shared.attach_listener(transport.as_ref());
				info!(target = "pairsign.session", "transport ready");
				Ok::<_, Error>(transport)
			})
			.await?;
		Ok(())
	}

	pub fn is_ready(&self) -> bool {
		self.shared.transport.initialized()
	}

	pub fn config(&self) -> &SessionConfig {
		&self.shared.config
	}

	/// Proposes a session requiring `capabilities`.
	///
	/// Resolves once the transport produced a pairing URI and the approval
	/// surface has been shown it. Await [`PendingSession::approved`] for the
	/// wallet's answer.
	pub async fn propose(&self, capabilities: &CapabilitySet) -> Result<PendingSession> {
		let transport = self.shared.transport().ok_or(Error::NotReady)?;

		let mut refused = None;
		let mut generation = 0;
		self.shared.transition(|snap| match snap.status {
			SessionStatus::Active(_) => {
				refused = Some(Error::AlreadyActive);
				false
			}
			SessionStatus::Proposing | SessionStatus::AwaitingApproval => {
				refused = Some(Error::ProposalPending);
				false
			}
			_ => {
				snap.generation += 1;
				generation = snap.generation;
				snap.status = SessionStatus::Proposing;
				true
			}
		});
		if let Some(err) = refused {
			return Err(err);
		}

		info!(
			target = "pairsign.session",
			generation,
			chains = ?capabilities.chain_ids(),
			methods = ?capabilities.methods(),
			events = ?capabilities.events(),
			"proposing session"
		);

		let mut guard = ProposingGuard {
			shared: &self.shared,
			generation,
			armed: true,
		};

		let proposal = match transport.connect(capabilities).await {
			Ok(proposal) => proposal,
			Err(err) => {
				guard.armed = false;
				warn!(target = "pairsign.session", generation, error = %err, "connect failed");
				self.shared
					.settle_pending(generation, SessionStatus::Failed(FailureReason::Transport(err.to_string())));
				return Err(err.into());
			}
		};
		guard.armed = false;

		self.shared.transition(|snap| {
			if snap.generation != generation || !matches!(snap.status, SessionStatus::Proposing) {
				return false;
			}
			snap.status = SessionStatus::AwaitingApproval;
			true
		});
		self.shared.surface.present(&proposal.pairing_uri);

		Ok(PendingSession::new(
			Arc::clone(&self.shared),
			transport,
			proposal,
			generation,
		))
	}

	/// Ends the active session from this side.
	///
	/// A no-op in every other state. When the transport refuses, the session
	/// stays active and the error is returned.
	pub async fn disconnect(&self) -> Result<()> {
		let (session, generation) = {
			let snap = self.shared.snapshot();
			match snap.status {
				SessionStatus::Active(session) => (session, snap.generation),
				other => {
					debug!(target = "pairsign.session", status = %other.kind(), "disconnect without active session");
					return Ok(());
				}
			}
		};
		let transport = self.shared.transport().ok_or(Error::NotReady)?;

		let outcome = transport
			.disconnect(session.topic(), &self.shared.config.disconnect_reason)
			.await;

		let ended = self.shared.transition(|snap| {
			let current = snap.generation == generation && snap.status.is_active();
			if !current || outcome.is_err() {
				return false;
			}
			snap.status = SessionStatus::Disconnected;
			true
		});

		match outcome {
			Ok(()) => {
				if ended {
					info!(target = "pairsign.session", topic = session.topic(), "session disconnected");
				}
				Ok(())
			}
			Err(err) if !self.is_current(generation) => {
				debug!(target = "pairsign.session", error = %err, "disconnect raced remote teardown");
				Ok(())
			}
			Err(err) => Err(err.into()),
		}
	}

	/// Applies a remote termination signal. Returns whether a session ended.
	///
	/// Only an active session whose topic matches is affected; `None` matches
	/// the active session. Every other state ignores the signal.
	pub fn remote_session_deleted(&self, topic: Option<&str>) -> bool {
		self.shared.remote_terminated(topic)
	}

	/// Disconnects and stops listening to the transport.
	pub async fn shutdown(&self) -> Result<()> {
		let result = self.disconnect().await;
		if self.shared.detach_listener().is_some() {
			debug!(target = "pairsign.session", "event listener stopped");
		}
		result
	}

	pub fn status(&self) -> SessionStatus {
		self.shared.snapshot().status
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		self.shared.snapshot()
	}

	pub fn view(&self) -> SessionView {
		self.shared.snapshot().view()
	}

	/// Receives every published transition.
	pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
		self.shared.subscribe()
	}

	pub fn active_session(&self) -> Option<ActiveSession> {
		self.shared.snapshot().status.active().cloned()
	}

	pub fn active_address(&self) -> Option<Address> {
		self.active_session().map(|s| s.address().clone())
	}

	pub fn last_tx(&self) -> Option<TxHash> {
		self.shared.snapshot().last_tx
	}

	/// Whether the event listener is running.
	pub fn is_listening(&self) -> bool {
		self.shared.listener.lock().is_some()
	}

	fn is_current(&self, generation: u64) -> bool {
		let snap = self.shared.state.lock();
		snap.generation == generation && snap.status.is_active()
	}
}

impl std::fmt::Debug for SessionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let snap = self.shared.snapshot();
		f.debug_struct("SessionManager")
			.field("status", &snap.status.kind())
			.field("generation", &snap.generation)
			.field("ready", &self.is_ready())
			.finish_non_exhaustive()
	}
}

/// Returns the manager to `Idle` when `propose` is dropped mid-connect.
struct ProposingGuard<'a> {
	shared: &'a Shared,
	generation: u64,
	armed: bool,
}

impl Drop for ProposingGuard<'_> {
	fn drop(&mut self) {
		if self.armed && self.shared.settle_pending(self.generation, SessionStatus::Idle) {
			debug!(target = "pairsign.session", generation = self.generation, "proposal dropped before connect completed");
		}
	}
}

#[cfg(test)]
mod tests;
