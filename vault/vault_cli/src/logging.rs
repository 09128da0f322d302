//! Log output for the command line.
//!
//! The library crates log through the `log` facade; the fmt subscriber
//! picks those records up alongside native `tracing` events. Output goes
//! to stderr so that stdout stays machine readable.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;
use vault_core::LogLevel;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level` when it is set. Targets are
/// shown only below `info`.
pub fn init(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(!level.is_at_least(LogLevel::Info))
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {}", e))?;

    tracing::debug!(%level, "logging initialised");
    Ok(())
}
