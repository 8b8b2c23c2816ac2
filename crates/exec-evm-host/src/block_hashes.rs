//! `BLOCKHASH` only resolves the 256 most recent ancestors; a fixed ring
//! buffer is the natural shape since anything older is simply unavailable,
//! not an error.

use exec_primitives::Hash256;

pub const BLOCKHASH_WINDOW: usize = 256;

/// Cheap to clone (a fixed 256-entry array) — the parallel block executor
/// hands every speculative transaction its own copy rather than sharing one
/// behind a lock, since `BLOCKHASH` lookups never change mid-block.
#[derive(Clone)]
pub struct BlockHashRing {
    hashes: [Hash256; BLOCKHASH_WINDOW],
    head_number: Option<u64>,
}

impl BlockHashRing {
    pub fn new() -> Self {
        BlockHashRing {
            hashes: [Hash256::ZERO; BLOCKHASH_WINDOW],
            head_number: None,
        }
    }

    pub fn push(&mut self, number: u64, hash: Hash256) {
        self.hashes[(number as usize) % BLOCKHASH_WINDOW] = hash;
        self.head_number = Some(number);
    }

    pub fn get(&self, number: u64) -> Option<Hash256> {
        let head = self.head_number?;
        if number > head || head.saturating_sub(number) >= BLOCKHASH_WINDOW as u64 {
            return None;
        }
        Some(self.hashes[(number as usize) % BLOCKHASH_WINDOW])
    }
}

impl Default for BlockHashRing {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_block_is_retrievable() {
        let mut ring = BlockHashRing::new();
        ring.push(10, Hash256([1; 32]));
        assert_eq!(ring.get(10), Some(Hash256([1; 32])));
    }

    #[test]
    fn beyond_window_returns_none() {
        let mut ring = BlockHashRing::new();
        for n in 0..300u64 {
            ring.push(n, Hash256([n as u8; 32]));
        }
        assert_eq!(ring.get(0), None);
        assert!(ring.get(299).is_some());
    }

    #[test]
    fn future_block_returns_none() {
        let mut ring = BlockHashRing::new();
        ring.push(10, Hash256([1; 32]));
        assert_eq!(ring.get(11), None);
    }
}
