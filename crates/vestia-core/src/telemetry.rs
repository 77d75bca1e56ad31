//! Tracing initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG`; falls back to `vestia=debug`. Safe to call from a
/// binary or a test harness; calling twice is an error from the registry,
/// which is surfaced to the caller.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "vestia=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
