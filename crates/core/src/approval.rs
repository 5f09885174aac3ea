//! The human-facing approval step.

use std::sync::Arc;

/// Shows a pairing URI to the user and hides it again.
///
/// Implementations know nothing about the protocol. `present` is called once
/// per proposal, `dismiss` once the proposal settles or is abandoned.
pub trait ApprovalSurface: Send + Sync {
	fn present(&self, uri: &str);
	fn dismiss(&self);
}

impl<T: ApprovalSurface + ?Sized> ApprovalSurface for Arc<T> {
	fn present(&self, uri: &str) {
		(**self).present(uri)
	}

	fn dismiss(&self) {
		(**self).dismiss()
	}
}

/// Surface that shows nothing, for headless callers that read the URI from
/// [`PendingSession::pairing_uri`](crate::PendingSession::pairing_uri).
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl ApprovalSurface for Headless {
	fn present(&self, uri: &str) {
		tracing::debug!(target = "pairsign.session", uri, "pairing uri ready");
	}

	fn dismiss(&self) {}
}
