//! # Logging Setup
//!
//! `RUST_LOG` selects what is printed (default `info`), e.g.
//! `RUST_LOG=info,sl_06_chain_sync=debug`.

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global `tracing` subscriber.
pub fn init_tracing() -> Result<(), SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
