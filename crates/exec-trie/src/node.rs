//! The two persisted Modified Merkle Patricia Trie node shapes — `Leaf` and
//! a `Branch` that folds what the Yellow Paper (Appendix D) splits into
//! separate extension and branch nodes into one `path_prefix`-carrying
//! node. Nothing in this engine ever stores a bare extension: a branch with
//! a single live child and no value is still written as a `Branch` whose
//! `path_prefix` covers the shared nibbles.
//!
//! Two independent encodings exist for a node:
//! - [`Node::rlp_encode`]/[`Node::hash`]/[`Node::from_bytes`]: the Merkle
//!   encoding, whose bytes and hash are consensus-visible (proofs ship
//!   these bytes) and reference children by their 32-byte hash alone.
//! - [`Node::encode_storage`]/[`Node::decode_storage`]: the on-disk record
//!   the chunked log actually stores, which additionally embeds each
//!   child's `(chunk_id, offset)` pointer so a reader can descend the trie
//!   without a separate hash-to-pointer index.

use crate::nibbles::Nibbles;
use crate::storage::NodePointer;
use exec_crypto::keccak256;
use exec_primitives::Hash256;
use exec_rlp::encode::{encode_bytes, encode_list_payload, Encodable};
use exec_rlp::{Decodable, Rlp, RlpError, RlpResult};

/// A branch child as the engine actually holds it: the Merkle-layer hash
/// (what consensus encoding and proofs see) paired with where it lives in
/// the chunk log (what lets a reopened engine find it again).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildRef {
    pub hash: Hash256,
    pub pointer: NodePointer,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Empty,
    Leaf {
        path: Nibbles,
        value: Vec<u8>,
    },
    Branch {
        path_prefix: Nibbles,
        children: Box<[Option<ChildRef>; 16]>,
        value: Option<Vec<u8>>,
    },
}

impl Node {
    pub fn rlp_encode(&self) -> Vec<u8> {
        match self {
            Node::Empty => vec![0x80],
            Node::Leaf { path, value } => {
                let encoded_path = path.encode_hex_prefix(true);
                two_item_list(&encoded_path, value)
            }
            Node::Branch { path_prefix, children, value } => {
                let encoded_path = path_prefix.encode_hex_prefix(false);
                let mut payload = Vec::new();
                encode_bytes(&encoded_path, &mut payload);
                for child in children.iter() {
                    match child {
                        Some(child) => encode_bytes(child.hash.as_bytes(), &mut payload),
                        None => encode_bytes(&[], &mut payload),
                    }
                }
                match value {
                    Some(v) => encode_bytes(v, &mut payload),
                    None => encode_bytes(&[], &mut payload),
                }
                let mut out = Vec::with_capacity(payload.len() + 9);
                encode_list_payload(&payload, &mut out);
                out
            }
        }
    }

    /// Keccak256 of the RLP encoding — the reference other nodes embed
    /// (directly if < 32 bytes, per Yellow Paper, but this engine always
    /// stores by hash for the chunked log's pointer uniformity).
    pub fn hash(&self) -> Hash256 {
        keccak256(&self.rlp_encode())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.rlp_encode()
    }

    /// Decode the Merkle encoding. Children come back with
    /// `pointer: NodePointer::NULL` — this path is for proof verification,
    /// which only ever needs a child's hash, never its storage location.
    pub fn from_bytes(bytes: &[u8]) -> RlpResult<Self> {
        if bytes == [0x80] {
            return Ok(Node::Empty);
        }
        let mut rlp = Rlp::new(bytes);
        let mut list = rlp.list()?;
        let count = count_items(bytes)?;
        match count {
            2 => {
                let path_bytes = list.bytes()?.to_vec();
                let (path, is_leaf) = Nibbles::decode_hex_prefix(&path_bytes);
                if is_leaf {
                    let value = list.bytes()?.to_vec();
                    Ok(Node::Leaf { path, value })
                } else {
                    Err(RlpError::ArrayLengthUnexpected { expected: 18, found: 2 })
                }
            }
            18 => {
                let path_bytes = list.bytes()?.to_vec();
                let (path_prefix, _) = Nibbles::decode_hex_prefix(&path_bytes);
                let mut children: Box<[Option<ChildRef>; 16]> = Box::new(Default::default());
                for slot in children.iter_mut() {
                    let raw = list.bytes()?;
                    *slot = if raw.is_empty() {
                        None
                    } else {
                        let arr: [u8; 32] = raw.try_into().map_err(|_| RlpError::ArrayLengthUnexpected {
                            expected: 32,
                            found: raw.len(),
                        })?;
                        Some(ChildRef { hash: Hash256(arr), pointer: NodePointer::NULL })
                    };
                }
                let value_bytes = list.bytes()?;
                let value = if value_bytes.is_empty() { None } else { Some(value_bytes.to_vec()) };
                Ok(Node::Branch { path_prefix, children, value })
            }
            n => Err(RlpError::ArrayLengthUnexpected { expected: 18, found: n }),
        }
    }

    const TAG_EMPTY: u8 = 0x00;
    const TAG_LEAF: u8 = 0x01;
    const TAG_BRANCH: u8 = 0x02;

    /// The chunked log's on-disk record: a tag byte, then a shape that
    /// embeds child pointers directly so [`crate::engine::TrieEngine`] never
    /// needs a hash-to-pointer index to resolve a child read.
    pub fn encode_storage(&self) -> Vec<u8> {
        match self {
            Node::Empty => vec![Self::TAG_EMPTY],
            Node::Leaf { path, value } => {
                let mut out = vec![Self::TAG_LEAF];
                write_u16_prefixed(&mut out, &path.0);
                write_u16_prefixed(&mut out, value);
                out
            }
            Node::Branch { path_prefix, children, value } => {
                let mut out = vec![Self::TAG_BRANCH];
                write_u16_prefixed(&mut out, &path_prefix.0);
                let mut bitmask: u16 = 0;
                for (i, child) in children.iter().enumerate() {
                    if child.is_some() {
                        bitmask |= 1 << i;
                    }
                }
                out.extend_from_slice(&bitmask.to_le_bytes());
                for child in children.iter().flatten() {
                    out.extend_from_slice(&child.pointer.pack().to_le_bytes()[..6]);
                    out.extend_from_slice(child.hash.as_bytes());
                }
                match value {
                    Some(v) => {
                        out.push(1);
                        write_u16_prefixed(&mut out, v);
                    }
                    None => out.push(0),
                }
                out
            }
        }
    }

    pub fn decode_storage(bytes: &[u8]) -> RlpResult<Self> {
        let mut cursor = 0usize;
        let tag = *bytes.first().ok_or(RlpError::InputTooShort)?;
        cursor += 1;
        match tag {
            Self::TAG_EMPTY => Ok(Node::Empty),
            Self::TAG_LEAF => {
                let path = read_u16_prefixed(bytes, &mut cursor)?;
                let value = read_u16_prefixed(bytes, &mut cursor)?;
                Ok(Node::Leaf { path: Nibbles(path), value })
            }
            Self::TAG_BRANCH => {
                let path_prefix = Nibbles(read_u16_prefixed(bytes, &mut cursor)?);
                let bitmask_bytes: [u8; 2] = bytes
                    .get(cursor..cursor + 2)
                    .ok_or(RlpError::InputTooShort)?
                    .try_into()
                    .unwrap();
                cursor += 2;
                let bitmask = u16::from_le_bytes(bitmask_bytes);
                let mut children: Box<[Option<ChildRef>; 16]> = Box::new(Default::default());
                for (i, slot) in children.iter_mut().enumerate() {
                    if bitmask & (1 << i) == 0 {
                        continue;
                    }
                    let pointer_bytes = bytes.get(cursor..cursor + 6).ok_or(RlpError::InputTooShort)?;
                    let mut packed = [0u8; 8];
                    packed[..6].copy_from_slice(pointer_bytes);
                    let pointer = NodePointer::unpack(u64::from_le_bytes(packed));
                    cursor += 6;
                    let hash_bytes: [u8; 32] =
                        bytes.get(cursor..cursor + 32).ok_or(RlpError::InputTooShort)?.try_into().unwrap();
                    cursor += 32;
                    *slot = Some(ChildRef { hash: Hash256(hash_bytes), pointer });
                }
                let has_value = *bytes.get(cursor).ok_or(RlpError::InputTooShort)?;
                cursor += 1;
                let value = if has_value == 1 { Some(read_u16_prefixed(bytes, &mut cursor)?) } else { None };
                Ok(Node::Branch { path_prefix, children, value })
            }
            _ => Err(RlpError::TypeUnexpected { expected: "node tag", found: "unknown" }),
        }
    }
}

fn write_u16_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
    out.extend_from_slice(bytes);
}

fn read_u16_prefixed(bytes: &[u8], cursor: &mut usize) -> RlpResult<Vec<u8>> {
    let len_bytes: [u8; 2] = bytes.get(*cursor..*cursor + 2).ok_or(RlpError::InputTooShort)?.try_into().unwrap();
    *cursor += 2;
    let len = u16::from_le_bytes(len_bytes) as usize;
    let data = bytes.get(*cursor..*cursor + len).ok_or(RlpError::InputTooShort)?.to_vec();
    *cursor += len;
    Ok(data)
}

fn two_item_list(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut payload = Vec::new();
    encode_bytes(a, &mut payload);
    encode_bytes(b, &mut payload);
    let mut out = Vec::with_capacity(payload.len() + 9);
    encode_list_payload(&payload, &mut out);
    out
}

fn count_items(bytes: &[u8]) -> RlpResult<usize> {
    let mut rlp = Rlp::new(bytes);
    let mut list = rlp.list()?;
    let mut count = 0;
    while !list.is_empty() {
        let _ = list.bytes()?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_node_hashes_to_the_empty_trie_root() {
        assert_eq!(Node::Empty.hash(), exec_primitives::EMPTY_TRIE_ROOT);
    }

    #[test]
    fn leaf_round_trips_through_bytes() {
        let node = Node::Leaf {
            path: Nibbles(vec![1, 2, 3]),
            value: b"value".to_vec(),
        };
        let bytes = node.to_bytes();
        let decoded = Node::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn branch_round_trips_through_merkle_bytes() {
        let mut children: Box<[Option<ChildRef>; 16]> = Box::new(Default::default());
        children[3] = Some(ChildRef { hash: Hash256([0x11; 32]), pointer: NodePointer::NULL });
        let node = Node::Branch {
            path_prefix: Nibbles(vec![7]),
            children,
            value: Some(b"v".to_vec()),
        };
        let bytes = node.to_bytes();
        let decoded = Node::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn branch_round_trips_through_storage_bytes_with_pointers_preserved() {
        let mut children: Box<[Option<ChildRef>; 16]> = Box::new(Default::default());
        children[3] = Some(ChildRef {
            hash: Hash256([0x11; 32]),
            pointer: NodePointer { chunk_id: 7, offset: 42 },
        });
        children[9] = Some(ChildRef {
            hash: Hash256([0x22; 32]),
            pointer: NodePointer { chunk_id: 0, offset: 0 },
        });
        let node = Node::Branch {
            path_prefix: Nibbles(vec![4, 5]),
            children,
            value: None,
        };
        let bytes = node.encode_storage();
        let decoded = Node::decode_storage(&bytes).unwrap();
        assert_eq!(decoded, node);
    }

    #[test]
    fn empty_and_leaf_round_trip_through_storage_bytes() {
        let empty = Node::Empty;
        assert_eq!(Node::decode_storage(&empty.encode_storage()).unwrap(), empty);

        let leaf = Node::Leaf { path: Nibbles(vec![1, 2]), value: b"x".to_vec() };
        assert_eq!(Node::decode_storage(&leaf.encode_storage()).unwrap(), leaf);
    }
}
