//! Root computation for the three list fields a header commits to.
//! `ommers_hash` is a plain `keccak256` of the RLP-encoded ommer list;
//! `transactions_root`/`receipts_root`/`withdrawals_root` are Modified
//! Merkle Patricia Trie roots keyed by each item's RLP-encoded list index.

use exec_crypto::keccak256;
use exec_primitives::Hash256;
use exec_rlp::encode::{Encodable, ListEncoder};
use exec_trie::{Nibbles, TrieEngine};
use std::path::Path;

pub fn ommers_hash(ommers: &[exec_chainspec::Header]) -> Hash256 {
    let mut encoder = ListEncoder::new();
    let mut raw = Vec::new();
    for ommer in ommers {
        ommer.rlp_append(&mut raw);
    }
    encoder = encoder.raw_field(&raw);
    let mut out = Vec::new();
    encoder.finish(&mut out);
    keccak256(&out)
}

/// Builds an ephemeral trie under `dir` keyed by `rlp(index)` and returns
/// its root hash once every item has been inserted. The trie itself is
/// thrown away — callers only need the root a given list of RLP-encoded
/// items would produce.
pub fn list_root(items: &[Vec<u8>], dir: impl AsRef<Path>) -> exec_trie::storage::StorageResult<Hash256> {
    let mut trie = TrieEngine::open(dir)?;
    for (index, item) in items.iter().enumerate() {
        let key = Nibbles::from_bytes(&(index as u64).rlp_encode());
        trie.put(&key, item.clone())?;
    }
    trie.commit();
    Ok(trie.root_hash())
}
