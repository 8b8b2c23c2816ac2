//! Merkle inclusion/exclusion proofs: a list of RLP-encoded nodes along the
//! root-to-key path, verifiable against a root hash without access to the
//! rest of the trie.

use crate::engine::TrieEngine;
use crate::nibbles::Nibbles;
use crate::node::Node;
use crate::storage::StorageResult;
use exec_crypto::keccak256;
use exec_primitives::Hash256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub nodes: Vec<Vec<u8>>,
}

impl TrieEngine {
    /// Collect every node's RLP encoding on the path from the root to
    /// `key`, stopping at the first leaf/empty slot — sufficient to prove
    /// either inclusion (the leaf holds the expected value) or exclusion
    /// (the path diverges or ends in an empty slot). Descent here follows
    /// each child's on-disk pointer, not its hash — [`verify_proof`] is the
    /// hash-chasing side of this, since a verifier only ever has the
    /// Merkle-layer bytes.
    pub fn generate_proof(&mut self, key: &Nibbles) -> StorageResult<Proof> {
        let mut nodes = Vec::new();
        let mut pointer = self.root();
        let mut path = key.clone();
        loop {
            let node = self.load_by_pointer(pointer, 0)?;
            nodes.push(node.to_bytes());
            match node {
                Node::Empty => break,
                Node::Leaf { .. } => break,
                Node::Branch { path_prefix, children, .. } => {
                    if path.common_prefix_len(&path_prefix) < path_prefix.len() {
                        break;
                    }
                    let rest = path.slice(path_prefix.len());
                    if rest.is_empty() {
                        break;
                    }
                    match children[rest.at(0) as usize] {
                        None => break,
                        Some(child) => {
                            path = rest.slice(1);
                            pointer = child.pointer;
                        }
                    }
                }
            }
        }
        Ok(Proof { nodes })
    }
}

/// Verify a proof against an expected root hash and key, returning the
/// value it attests to (`None` proves the key's absence).
pub fn verify_proof(expected_root: Hash256, key: &Nibbles, proof: &Proof) -> Option<Option<Vec<u8>>> {
    if proof.nodes.is_empty() {
        return if expected_root == exec_primitives::EMPTY_TRIE_ROOT {
            Some(None)
        } else {
            None
        };
    }

    let mut expected_hash = expected_root;
    let mut path = key.clone();

    for (i, encoded) in proof.nodes.iter().enumerate() {
        let actual_hash = keccak256(encoded);
        if actual_hash != expected_hash {
            return None;
        }
        let node = Node::from_bytes(encoded).ok()?;
        let is_last = i + 1 == proof.nodes.len();
        match node {
            Node::Empty => return Some(None),
            Node::Leaf { path: leaf_path, value } => {
                return Some(if leaf_path == path { Some(value) } else { None });
            }
            Node::Branch { path_prefix, children, value } => {
                if path.common_prefix_len(&path_prefix) < path_prefix.len() {
                    return Some(None);
                }
                let rest = path.slice(path_prefix.len());
                if rest.is_empty() {
                    return Some(value);
                }
                match children[rest.at(0) as usize] {
                    None => return Some(None),
                    Some(child) => {
                        path = rest.slice(1);
                        expected_hash = child.hash;
                        if is_last {
                            return None;
                        }
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use exec_primitives::Address;

    #[test]
    fn inclusion_proof_verifies_and_returns_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TrieEngine::open(dir.path()).unwrap();
        let key = Nibbles::from_address(&Address([0x09; 20]));
        engine.put(&key, b"value".to_vec()).unwrap();
        let root = engine.root_hash();
        let proof = engine.generate_proof(&key).unwrap();
        assert_eq!(verify_proof(root, &key, &proof), Some(Some(b"value".to_vec())));
    }

    #[test]
    fn exclusion_proof_verifies_absence() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TrieEngine::open(dir.path()).unwrap();
        let present = Nibbles::from_address(&Address([0x09; 20]));
        let absent = Nibbles::from_address(&Address([0x0a; 20]));
        engine.put(&present, b"value".to_vec()).unwrap();
        let root = engine.root_hash();
        let proof = engine.generate_proof(&absent).unwrap();
        assert_eq!(verify_proof(root, &absent, &proof), Some(None));
    }

    #[test]
    fn proof_against_wrong_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = TrieEngine::open(dir.path()).unwrap();
        let key = Nibbles::from_address(&Address([0x09; 20]));
        engine.put(&key, b"value".to_vec()).unwrap();
        let proof = engine.generate_proof(&key).unwrap();
        assert_eq!(verify_proof(Hash256([0xee; 32]), &key, &proof), None);
    }
}
