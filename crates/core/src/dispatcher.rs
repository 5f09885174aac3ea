//! Signed-operation requests routed over the active session.

use pairsign_protocol::{ETH_SEND_TRANSACTION, RpcRequest, TransactionRequest, TxHash};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::session::SessionManager;
use crate::status::{ActiveSession, SessionSnapshot};

impl SessionManager {
	/// Asks the wallet to sign and broadcast `tx`.
	///
	/// `from` is filled with the active address when unset. The returned
	/// hash is the wallet's, unmodified, and becomes the session's last
	/// transaction. Failures leave the session active and the last
	/// transaction untouched.
	pub async fn sign_and_send(&self, tx: TransactionRequest) -> Result<TxHash> {
		let (session, _) = self.require_method(ETH_SEND_TRANSACTION)?;
		let tx = match tx.from {
			Some(_) => tx,
			None => tx.with_from(session.address().clone()),
		};

		let params = Value::Array(vec![serde_json::to_value(&tx)?]);
		let (generation, result) = self.dispatch(ETH_SEND_TRANSACTION, params).await?;

		let hash = match result {
			Value::String(hash) => TxHash::new(hash),
			other => {
				return Err(Error::TransportFailure(pairsign_runtime::Error::ProtocolError(format!(
					"expected transaction hash, got {other}"
				))));
			}
		};

		let recorded = self.shared.transition(|snap| {
			if snap.generation != generation || !snap.status.is_active() {
				return false;
			}
			snap.last_tx = Some(hash.clone());
			true
		});
		if !recorded {
			return Err(Error::NoActiveSession);
		}

		info!(target = "pairsign.session", tx = %hash, "transaction sent");
		Ok(hash)
	}

	/// Forwards an arbitrary approved method over the active session.
	pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
		self.require_method(method)?;
		let (_, result) = self.dispatch(method, params).await?;
		Ok(result)
	}

	fn require_method(&self, method: &str) -> Result<(ActiveSession, u64)> {
		let snap = self.shared.snapshot();
		let session = snap.status.active().ok_or(Error::NoActiveSession)?;
		if !session.record().capabilities.allows_method(method) {
			return Err(Error::MethodNotApproved(method.to_string()));
		}
		Ok((session.clone(), snap.generation))
	}

	/// Sends one request, racing it against the session ending.
	///
	/// Returns the generation the request was issued under. A termination
	/// observed while the request is in flight wins and yields
	/// [`Error::NoActiveSession`], as does a session that ended by the time
	/// the transport answered.
	async fn dispatch(&self, method: &str, params: Value) -> Result<(u64, Value)> {
		let transport = self.shared.transport().ok_or(Error::NotReady)?;

		let mut updates = self.shared.subscribe();
		let (session, generation) = {
			let snap = updates.borrow_and_update();
			match snap.status.active() {
				Some(session) => (session.clone(), snap.generation),
				None => return Err(Error::NoActiveSession),
			}
		};

		let request = RpcRequest::new(method, params);
		debug!(
			target = "pairsign.session",
			topic = session.topic(),
			chain = %session.chain_id(),
			method,
			"dispatching request"
		);

		let ended = |snap: &SessionSnapshot| snap.generation != generation || !snap.status.is_active();

		let result = tokio::select! {
			biased;
			_ = updates.wait_for(ended) => {
				warn!(target = "pairsign.session", method, "session ended while request was in flight");
				return Err(Error::NoActiveSession);
			}
			result = transport.request(session.topic(), session.chain_id(), request) => result,
		};

		if ended(&self.shared.snapshot()) {
			return Err(Error::NoActiveSession);
		}

		match result {
			Ok(value) => Ok((generation, value)),
			Err(err) => {
				warn!(target = "pairsign.session", method, error = %err, "request failed");
				Err(err.into())
			}
		}
	}
}
