use std::io::Write;

use colored::Colorize;
use pairsign::ApprovalSurface;

/// Prints the pairing URI to stderr so stdout stays machine-readable.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl ApprovalSurface for TerminalSurface {
	fn present(&self, uri: &str) {
		let mut stderr = std::io::stderr().lock();
		let _ = writeln!(stderr, "{}", "Open this URI in your wallet to approve the session:".bold());
		let _ = writeln!(stderr, "  {}", uri.cyan());
		let _ = writeln!(stderr, "{}", "Waiting for approval...".dimmed());
	}

	fn dismiss(&self) {
		tracing::debug!(target = "pairsign", "approval prompt closed");
	}
}
