//! Dev-time diagnostics, separate from the fixed supervision messages.
//!
//! The supervision messages (`Running ...`, exit reports, wait notices) are
//! the program's output contract and go straight to the redirected streams
//! so they reach the sinks. Tracing is only for debugging the supervisor
//! itself.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing. Reads `RUST_LOG`, defaults to `warn` if unset.
/// Writes to stderr, so enabled diagnostics flow into the stderr sink once
/// one is attached.
pub fn init() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr).compact())
		.init();
}
