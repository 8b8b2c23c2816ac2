use exec_primitives::Hash256;
use sha3::{Digest, Keccak256};

/// Keccak-256, the hash underlying block/transaction/receipt identifiers,
/// trie node references, and address derivation.
pub fn keccak256(data: &[u8]) -> Hash256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let out: [u8; 32] = hasher.finalize().into();
    Hash256(out)
}

/// BLAKE3, used for the storage engine's chunk-level integrity checksums
/// where Keccak's extra cost buys nothing (no on-chain verifiability
/// requirement, just corruption detection).
pub fn blake3_hash(data: &[u8]) -> Hash256 {
    Hash256(*blake3::hash(data).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_of_empty_matches_known_constant() {
        assert_eq!(keccak256(&[]), exec_primitives::NULL_HASH);
    }

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"abc"), blake3_hash(b"abc"));
    }
}
