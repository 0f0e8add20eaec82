//! Tracing initialization for the server binary.

use tracing_subscriber::{fmt, EnvFilter, prelude::*};

/// Filter used when RUST_LOG is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,exodia=debug,tower_http=info,axum=info";

/// Install the global subscriber. Fails if one is already set.
///
/// RUST_LOG overrides the filter, e.g. `RUST_LOG=exodia::store=trace,tower_http=debug`.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).compact())
        .try_init()?;
    Ok(())
}
