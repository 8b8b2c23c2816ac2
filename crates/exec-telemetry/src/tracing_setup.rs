//! `tracing`/`tracing-subscriber` wiring. The teacher's full LGTM/
//! OpenTelemetry stack (Tempo traces, Loki log shipping, Prometheus
//! metrics) belongs to a deployed node's sidecar, not a library execution
//! core — this crate keeps only the env-filtered subscriber every one of
//! the teacher's own crates already instruments against.

use crate::config::LogConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build the env filter: {0}")]
    Filter(String),

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Holds nothing but exists so call sites bind the result to a guard, the
/// same shape as the teacher's OTel-shutdown-on-drop guard — there's no
/// provider here to flush, since this subscriber writes straight to
/// stdout/stderr.
pub struct TracingGuard(());

/// Install a global `tracing` subscriber filtered by `config.filter`
/// (`RUST_LOG` takes precedence if set), formatting either as JSON or the
/// human-readable default.
pub fn init_tracing(config: &LogConfig) -> Result<TracingGuard, TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|err| TelemetryError::Filter(err.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|_| TelemetryError::AlreadyInitialized)?;

    tracing::info!(service = %config.service_name, "tracing initialized");
    Ok(TracingGuard(()))
}
