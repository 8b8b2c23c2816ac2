//! Thin entry point: load configuration, initialize logging, open a
//! [`NodeRuntime`] against the given data directories, and report readiness.
//! P2P, consensus, mempool, and RPC serving are out of scope for this
//! workspace — wiring those in is left to a caller that embeds this crate.

use anyhow::Context;
use exec_node::{ExecConfig, NodeRuntime};
use exec_telemetry::{init_tracing, LogConfig};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let state_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./data/state"));
    let roots_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./data/roots"));
    let config_path = args.next().map(PathBuf::from);

    let _guard = init_tracing(&LogConfig::default()).context("failed to initialize tracing")?;

    let config = ExecConfig::load(config_path.as_deref()).context("failed to load exec-node configuration")?;
    tracing::info!(chain_id = config.chain_id, worker_count = config.worker_count, "loaded configuration");

    let runtime = NodeRuntime::open(&state_dir, &roots_dir, &config).context("failed to open node runtime")?;
    tracing::info!(?state_dir, ?roots_dir, "execution core ready");
    runtime.shutdown();

    Ok(())
}
