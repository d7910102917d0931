//! Diagnostic logging setup.
//!
//! User-facing status lines go through `cli::output`; this is for `tracing`
//! events from the engine and stores, written to stderr.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Fails only if a subscriber is already installed (e.g. tests).
    let _ = tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .finish(),
    );
}
