use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Directives used when `RUST_LOG` is unset.
///
/// Relay traffic is filtered by the runtime crate's module path.
fn default_filter(verbosity: u8) -> &'static str {
	// 0: errors only, relay chatter off
	// 1 (-v): session lifecycle at info
	// 2+ (-vv): debug, including wire traffic
	match verbosity {
		0 => "error,pairsign_runtime=off",
		1 => "info,pairsign_runtime=warn",
		_ => "debug",
	}
}

pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(false)
		.with_level(true)
		.compact()
		.init();
}
