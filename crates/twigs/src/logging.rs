//! Diagnostic logging setup
//!
//! Logs always go to stderr so `twigs goto` output stays scriptable.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "twigs=debug,twigs_core=debug"
    } else {
        "twigs=warn,twigs_core=warn"
    }
}

/// Initialise the global tracing subscriber
///
/// `RUST_LOG` wins over `verbose` when both are present.
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter(verbose).into()),
    );
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose),
        )
        .try_init();
}
