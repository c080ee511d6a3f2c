//! Diagnostic tracing for hub-comment.
//!
//! Logs go to stderr so stdout carries only the report. Verbosity comes from
//! `RUST_LOG` and defaults to `warn`.
//!
//! ```bash
//! RUST_LOG=hub_comment=debug,hub_client=debug hub-comment --template "hi"
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
