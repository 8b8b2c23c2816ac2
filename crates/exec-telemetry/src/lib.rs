//! # Execution Telemetry
//!
//! Logging initialization for the execution core: a single
//! `init_tracing(LogConfig) -> TracingGuard` entry point, adapted from the
//! teacher's full LGTM-stack telemetry crate down to the one piece a
//! library execution core actually needs.

mod config;
mod tracing_setup;

pub use config::LogConfig;
pub use tracing_setup::{init_tracing, TelemetryError, TracingGuard};
