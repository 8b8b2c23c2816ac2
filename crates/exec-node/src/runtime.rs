//! Top-level wiring: the trie-backed state, chain spec, fiber pool, and
//! block-hash ring `exec-executor::execute_block` needs, assembled once per
//! node and reused across blocks.

use crate::config::ExecConfig;
use exec_chainspec::ChainSpec;
use exec_evm_host::{BlockHashRing, Evm};
use exec_executor::{execute_block, Block, ExecutionOutcome};
use exec_fiber::{PoolConfig, PriorityPool};
use exec_primitives::Hash256;
use exec_state::BlockState;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct NodeRuntime {
    state: BlockState,
    chain: ChainSpec,
    block_hashes: BlockHashRing,
    pool: PriorityPool,
    roots_dir: PathBuf,
    compact_interval_blocks: u64,
}

impl NodeRuntime {
    pub fn open(state_dir: impl AsRef<Path>, roots_dir: impl AsRef<Path>, config: &ExecConfig) -> anyhow::Result<Self> {
        let io_ring = exec_io::default_node_ring(config.io_queue_depth, config.io_buffer_slots)?;
        let state = BlockState::open_with_cache_and_ring(
            state_dir,
            config.node_cache_shallow,
            config.node_cache_deep,
            io_ring,
        )?;
        let chain = ChainSpec::mainnet_shaped(config.chain_id);
        let pool = PriorityPool::new(PoolConfig {
            worker_count: config.worker_count,
            submission_capacity: config.submission_capacity,
        });
        Ok(NodeRuntime {
            state,
            chain,
            block_hashes: BlockHashRing::new(),
            pool,
            roots_dir: roots_dir.as_ref().to_path_buf(),
            compact_interval_blocks: config.compact_interval_blocks.max(1),
        })
    }

    /// Record a block's hash so `BLOCKHASH` can resolve it from later
    /// blocks, up to the 256-block window.
    pub fn record_block_hash(&mut self, number: u64, hash: Hash256) {
        self.block_hashes.push(number, hash);
    }

    pub fn execute(&mut self, block: &Block, evm: Arc<dyn Evm>) -> anyhow::Result<ExecutionOutcome> {
        let outcome =
            execute_block(block, &mut self.state, &self.chain, &self.block_hashes, evm, &self.pool, &self.roots_dir)?;
        self.record_block_hash(block.header.number, block.header.hash());
        if block.header.number % self.compact_interval_blocks == 0 {
            let removed = self.state.compact()?;
            if removed > 0 {
                tracing::debug!(removed, block = block.header.number, "trie compaction reclaimed chunks");
            }
        }
        Ok(outcome)
    }

    pub fn shutdown(self) {
        self.pool.shutdown();
    }
}
