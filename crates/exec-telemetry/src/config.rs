//! Logging configuration, loaded the way `exec-node` loads the rest of its
//! config: a plain `serde`-deserializable struct with a `Default` impl, not
//! environment variables.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Service name attached to every log line's target field.
    pub service_name: String,

    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or
    /// `"exec_executor=debug,info"`. `RUST_LOG` overrides this if set.
    pub filter: String,

    /// Structured JSON output instead of the human-readable formatter.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { service_name: "exec-core".to_string(), filter: "info".to_string(), json: false }
    }
}
