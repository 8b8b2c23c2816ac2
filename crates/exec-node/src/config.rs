//! Runtime configuration: worker/fiber counts, trie node cache sizing, and
//! I/O ring depth, loaded from an optional TOML file the way the teacher's
//! `NodeConfig`/`StorageConfig` structs are — a plain `serde`-deserializable
//! struct with a `Default` impl, validated on load rather than on every
//! field access.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Chain id the runtime validates transactions and signatures against.
    pub chain_id: u64,

    /// `PriorityPool` worker thread count for parallel sender recovery.
    pub worker_count: usize,

    /// `PriorityPool` bounded submission channel depth.
    pub submission_capacity: usize,

    /// Shallow `NodeCache` capacity (hot trie nodes kept in memory).
    pub node_cache_shallow: usize,

    /// Deep `NodeCache` capacity (the larger, colder tier).
    pub node_cache_deep: usize,

    /// `io_uring` (or portable fallback) submission queue depth.
    pub io_queue_depth: u32,

    /// Pinned buffer slots backing the I/O ring's read/write completions.
    pub io_buffer_slots: usize,

    /// Run trie compaction once every this many executed blocks. Compaction
    /// only ever reclaims chunks already outside `VersionIndex`'s retention
    /// window, so a shorter interval just means smaller, more frequent
    /// sweeps rather than a correctness difference.
    pub compact_interval_blocks: u64,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            chain_id: 1,
            worker_count: num_cpus::get().max(1),
            submission_capacity: 4096,
            node_cache_shallow: 4096,
            node_cache_deep: 65536,
            io_queue_depth: 256,
            io_buffer_slots: 256,
            compact_interval_blocks: 1024,
        }
    }
}

impl ExecConfig {
    /// Load from a TOML file, falling back to [`Self::default`] when `path`
    /// is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
        }
    }
}
