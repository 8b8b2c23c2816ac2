//! Persistent, versioned Merkle Patricia Trie built on the chunked node
//! log. Every [`TrieEngine::commit`] writes only the nodes that changed
//! along the updated key's path — unchanged subtrees are referenced by
//! their existing pointer, giving every past version a cheap,
//! copy-on-write snapshot instead of a full rebuild.
//!
//! Child references are resolved purely by [`NodePointer`], never by
//! re-deriving a hash-to-pointer mapping: the root pointer lives in
//! [`TrieEngine::root`], and every other child's pointer travels with its
//! parent's on-disk record (see [`Node::encode_storage`]). That is also
//! what makes reopening a persisted trie safe — [`Self::open`] replays the
//! small version log next to the chunk log to recover the last committed
//! root pointer instead of starting from an empty trie every time.

use crate::nibbles::Nibbles;
use crate::node::{ChildRef, Node};
use crate::storage::compaction;
use crate::storage::{ChunkLog, NodeCache, NodePointer, StorageError, StorageResult, VersionIndex};
use exec_io::NodeRing;
use exec_primitives::Hash256;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const VERSION_RECORD_LEN: usize = 8 + 4 + 2 + 32;

/// A snapshot's cache is sized for a single transaction's read set, not a
/// node's whole working set — it's thrown away once the transaction's
/// speculative pass finishes.
const SNAPSHOT_CACHE_SHALLOW: usize = 256;
const SNAPSHOT_CACHE_DEEP: usize = 1024;

pub struct TrieEngine {
    log: ChunkLog,
    cache: NodeCache,
    versions: VersionIndex,
    version_log_path: PathBuf,
    root: NodePointer,
    root_hash: Hash256,
    version: u64,
}

impl TrieEngine {
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_cache(dir, 4096, 65536)
    }

    /// Same as [`Self::open`], with the shallow/deep [`NodeCache`] capacities
    /// exposed for callers that size them from a node's own cache budget
    /// instead of this crate's defaults.
    pub fn open_with_cache(
        dir: impl AsRef<Path>,
        shallow_capacity: usize,
        deep_capacity: usize,
    ) -> StorageResult<Self> {
        let log = ChunkLog::open(dir.as_ref())?;
        Self::open_with_log(dir, log, shallow_capacity, deep_capacity)
    }

    /// Same as [`Self::open_with_cache`], routing the chunk log's reads and
    /// writes through a caller-supplied ring instead of building its own
    /// default one — lets [`exec_node`]'s runtime share a single ring across
    /// the accounts and storage tries instead of each opening its own
    /// thread pool.
    pub fn open_with_cache_and_ring(
        dir: impl AsRef<Path>,
        shallow_capacity: usize,
        deep_capacity: usize,
        ring: Arc<dyn NodeRing>,
    ) -> StorageResult<Self> {
        let log = ChunkLog::open_with_ring(dir.as_ref(), ring)?;
        Self::open_with_log(dir, log, shallow_capacity, deep_capacity)
    }

    fn open_with_log(
        dir: impl AsRef<Path>,
        mut log: ChunkLog,
        shallow_capacity: usize,
        deep_capacity: usize,
    ) -> StorageResult<Self> {
        let dir = dir.as_ref();
        let version_log_path = dir.join("versions.log");
        let (versions, latest) = replay_version_log(&version_log_path)?;

        let (root, root_hash, version) = match latest {
            Some((version, root, root_hash)) => (root, root_hash, version),
            None => {
                let empty_bytes = Node::Empty.encode_storage();
                let root = log.append(&empty_bytes)?;
                (root, exec_primitives::EMPTY_TRIE_ROOT, 0)
            }
        };

        Ok(TrieEngine {
            log,
            cache: NodeCache::new(shallow_capacity, deep_capacity),
            versions,
            version_log_path,
            root,
            root_hash,
            version,
        })
    }

    pub fn root_hash(&self) -> Hash256 {
        self.root_hash
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn root(&self) -> NodePointer {
        self.root
    }

    pub(crate) fn load_by_pointer(&mut self, pointer: NodePointer, depth: usize) -> StorageResult<Node> {
        if let Some(node) = self.cache.get(&pointer) {
            return Ok(node);
        }
        let bytes = self.log.read(pointer)?;
        let node = Node::decode_storage(&bytes)?;
        self.cache.insert(pointer, node.clone(), depth);
        Ok(node)
    }

    fn store(&mut self, node: Node, depth: usize) -> StorageResult<ChildRef> {
        let hash = node.hash();
        let bytes = node.encode_storage();
        let pointer = self.log.append(&bytes)?;
        self.cache.insert(pointer, node, depth);
        Ok(ChildRef { hash, pointer })
    }

    pub fn get(&mut self, key_nibbles: &Nibbles) -> StorageResult<Option<Vec<u8>>> {
        let root = self.root;
        self.get_at(root, key_nibbles, 0)
    }

    fn get_at(&mut self, pointer: NodePointer, path: &Nibbles, depth: usize) -> StorageResult<Option<Vec<u8>>> {
        let node = self.load_by_pointer(pointer, depth)?;
        match node {
            Node::Empty => Ok(None),
            Node::Leaf { path: leaf_path, value } => Ok(if &leaf_path == path { Some(value) } else { None }),
            Node::Branch { path_prefix, children, value } => {
                if path.common_prefix_len(&path_prefix) < path_prefix.len() {
                    return Ok(None);
                }
                let rest = path.slice(path_prefix.len());
                if rest.is_empty() {
                    return Ok(value);
                }
                match children[rest.at(0) as usize] {
                    None => Ok(None),
                    Some(child) => self.get_at(child.pointer, &rest.slice(1), depth + 1),
                }
            }
        }
    }

    /// Insert or overwrite `key_nibbles -> value`, returning the new root
    /// hash. Does not advance the committed version; call [`Self::commit`]
    /// once a batch of writes for a block is complete.
    pub fn put(&mut self, key_nibbles: &Nibbles, value: Vec<u8>) -> StorageResult<Hash256> {
        let root = self.root;
        let new_root = self.insert(root, key_nibbles, value, 0)?;
        let stored = self.store(new_root, 0)?;
        self.root = stored.pointer;
        self.root_hash = stored.hash;
        Ok(stored.hash)
    }

    /// Recursive insert, Yellow Paper Appendix D `UPDATE` collapsed to the
    /// two persisted shapes: a leaf splits into a branch (with a
    /// `path_prefix` covering the shared nibbles) instead of an extension
    /// wrapping a separately-stored branch.
    fn insert(&mut self, pointer: NodePointer, path: &Nibbles, value: Vec<u8>, depth: usize) -> StorageResult<Node> {
        let node = self.load_by_pointer(pointer, depth)?;
        match node {
            Node::Empty => Ok(Node::Leaf { path: path.clone(), value }),
            Node::Leaf { path: leaf_path, value: leaf_value } => {
                if leaf_path == *path {
                    return Ok(Node::Leaf { path: leaf_path, value });
                }
                let shared = leaf_path.common_prefix_len(path);
                let mut children: Box<[Option<ChildRef>; 16]> = Box::new(Default::default());
                let mut branch_value = None;

                if leaf_path.len() == shared {
                    branch_value = Some(leaf_value);
                } else {
                    let idx = leaf_path.at(shared) as usize;
                    let stored = self.store(
                        Node::Leaf { path: leaf_path.slice(shared + 1), value: leaf_value },
                        depth + shared + 1,
                    )?;
                    children[idx] = Some(stored);
                }

                if path.len() == shared {
                    branch_value = Some(value);
                } else {
                    let idx = path.at(shared) as usize;
                    let stored =
                        self.store(Node::Leaf { path: path.slice(shared + 1), value }, depth + shared + 1)?;
                    children[idx] = Some(stored);
                }

                Ok(Node::Branch { path_prefix: path.slice_range(0, shared), children, value: branch_value })
            }
            Node::Branch { path_prefix, mut children, value: branch_value } => {
                let shared = path_prefix.common_prefix_len(path);

                if shared == path_prefix.len() {
                    let rest = path.slice(shared);
                    if rest.is_empty() {
                        return Ok(Node::Branch { path_prefix, children, value: Some(value) });
                    }
                    let idx = rest.at(0) as usize;
                    let stored = match children[idx] {
                        None => self.store(Node::Leaf { path: rest.slice(1), value }, depth + shared + 1)?,
                        Some(child) => {
                            let new_child = self.insert(child.pointer, &rest.slice(1), value, depth + shared + 1)?;
                            self.store(new_child, depth + shared + 1)?
                        }
                    };
                    children[idx] = Some(stored);
                    return Ok(Node::Branch { path_prefix, children, value: branch_value });
                }

                // The new key diverges partway through this branch's prefix:
                // re-home the existing branch (with its remaining prefix)
                // under a fresh divergence-point branch alongside the new key.
                let mut new_children: Box<[Option<ChildRef>; 16]> = Box::new(Default::default());
                let old_remainder = path_prefix.slice(shared + 1);
                let old_slot = path_prefix.at(shared) as usize;
                let old_stored = self.store(
                    Node::Branch { path_prefix: old_remainder, children, value: branch_value },
                    depth + shared + 1,
                )?;
                new_children[old_slot] = Some(old_stored);

                let new_branch_value = if path.len() == shared {
                    Some(value)
                } else {
                    let idx = path.at(shared) as usize;
                    let stored =
                        self.store(Node::Leaf { path: path.slice(shared + 1), value }, depth + shared + 1)?;
                    new_children[idx] = Some(stored);
                    None
                };

                Ok(Node::Branch {
                    path_prefix: path.slice_range(0, shared),
                    children: new_children,
                    value: new_branch_value,
                })
            }
        }
    }

    /// Advance the working root into a new, addressable version, and
    /// append its root pointer to the on-disk version log so a later
    /// [`Self::open`] can recover it.
    pub fn commit(&mut self) -> u64 {
        self.version += 1;
        self.versions.record(self.version, self.root, self.root_hash);
        // Best-effort: a failure here means the next open falls back to an
        // earlier recovered version, not data loss (the chunk log already
        // holds every node this version references).
        let _ = append_version_record(&self.version_log_path, self.version, self.root, self.root_hash);
        self.version
    }

    pub fn version_root(&self, version: u64) -> Option<Hash256> {
        self.versions.get(version).map(|e| e.root_hash)
    }

    /// A read-only handle pinned to the trie's current root, for a
    /// speculative transaction to read against without racing whatever the
    /// canonical engine does next. Shares the chunk log's open file handles
    /// (cloning `Arc<File>`s, not reopening them) but gets its own empty
    /// cache and never calls [`Self::commit`], so nothing it does is
    /// visible back on the canonical engine.
    pub fn snapshot(&self) -> TrieEngine {
        TrieEngine {
            log: self.log.clone(),
            cache: NodeCache::new(SNAPSHOT_CACHE_SHALLOW, SNAPSHOT_CACHE_DEEP),
            versions: VersionIndex::new(),
            version_log_path: self.version_log_path.clone(),
            root: self.root,
            root_hash: self.root_hash,
            version: self.version,
        }
    }

    /// Reclaim chunks no longer reachable from any version still inside the
    /// retention window. Safe to call concurrently with reads — a chunk is
    /// only ever removed once nothing in [`VersionIndex`] can still
    /// reference it, and the active (currently-being-written) chunk is
    /// never swept. Returns the number of chunk files removed.
    pub fn compact(&mut self) -> StorageResult<usize> {
        let mut live_roots = self.versions.live_roots();
        live_roots.push(self.root);
        let reachable = compaction::reachable_chunks(&mut self.log, &live_roots)?;
        compaction::sweep(&mut self.log, &reachable)
    }
}

fn append_version_record(
    path: &Path,
    version: u64,
    root: NodePointer,
    root_hash: Hash256,
) -> StorageResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut record = [0u8; VERSION_RECORD_LEN];
    record[0..8].copy_from_slice(&version.to_le_bytes());
    record[8..14].copy_from_slice(&root.pack().to_le_bytes()[..6]);
    record[14..46].copy_from_slice(root_hash.as_bytes());
    file.write_all(&record)?;
    Ok(())
}

/// Replay every record in the version log, rebuilding the in-memory ring
/// buffer and returning the last (version, root pointer, root hash) if any
/// were recorded. A truncated trailing record (a crash mid-append) is
/// dropped rather than treated as an error.
fn replay_version_log(path: &Path) -> StorageResult<(VersionIndex, Option<(u64, NodePointer, Hash256)>)> {
    let mut versions = VersionIndex::new();
    let mut latest = None;

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok((versions, None)),
        Err(err) => return Err(StorageError::Io(err)),
    };

    for chunk in bytes.chunks_exact(VERSION_RECORD_LEN) {
        let version = u64::from_le_bytes(chunk[0..8].try_into().unwrap());
        let mut packed = [0u8; 8];
        packed[..6].copy_from_slice(&chunk[8..14]);
        let root = NodePointer::unpack(u64::from_le_bytes(packed));
        let root_hash = Hash256(chunk[14..46].try_into().unwrap());
        versions.record(version, root, root_hash);
        latest = Some((version, root, root_hash));
    }
    Ok((versions, latest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use exec_primitives::Address;

    fn open() -> (tempfile::TempDir, TrieEngine) {
        let dir = tempfile::tempdir().unwrap();
        let engine = TrieEngine::open(dir.path()).unwrap();
        (dir, engine)
    }

    #[test]
    fn empty_trie_root_is_the_empty_trie_root_constant() {
        let (_dir, engine) = open();
        assert_eq!(engine.root_hash(), exec_primitives::EMPTY_TRIE_ROOT);
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, mut engine) = open();
        let key = Nibbles::from_address(&Address([0x01; 20]));
        engine.put(&key, b"balance=100".to_vec()).unwrap();
        assert_eq!(engine.get(&key).unwrap(), Some(b"balance=100".to_vec()));
    }

    #[test]
    fn distinct_keys_do_not_overwrite_each_other() {
        let (_dir, mut engine) = open();
        let a = Nibbles::from_address(&Address([0x01; 20]));
        let b = Nibbles::from_address(&Address([0x02; 20]));
        engine.put(&a, b"a".to_vec()).unwrap();
        engine.put(&b, b"b".to_vec()).unwrap();
        assert_eq!(engine.get(&a).unwrap(), Some(b"a".to_vec()));
        assert_eq!(engine.get(&b).unwrap(), Some(b"b".to_vec()));
    }

    #[test]
    fn same_inputs_produce_same_root_hash_regardless_of_insert_order() {
        let (_dir1, mut e1) = open();
        let (_dir2, mut e2) = open();
        let a = Nibbles::from_address(&Address([0x01; 20]));
        let b = Nibbles::from_address(&Address([0x02; 20]));
        e1.put(&a, b"a".to_vec()).unwrap();
        e1.put(&b, b"b".to_vec()).unwrap();
        e2.put(&b, b"b".to_vec()).unwrap();
        e2.put(&a, b"a".to_vec()).unwrap();
        assert_eq!(e1.root_hash(), e2.root_hash());
    }

    #[test]
    fn commit_advances_version_and_records_root() {
        let (_dir, mut engine) = open();
        let key = Nibbles::from_address(&Address([0x01; 20]));
        engine.put(&key, b"v1".to_vec()).unwrap();
        let v1 = engine.commit();
        let root_at_v1 = engine.root_hash();
        engine.put(&key, b"v2".to_vec()).unwrap();
        engine.commit();
        assert_eq!(engine.version_root(v1), Some(root_at_v1));
    }

    #[test]
    fn overwriting_a_key_updates_its_value() {
        let (_dir, mut engine) = open();
        let key = Nibbles::from_address(&Address([0x03; 20]));
        engine.put(&key, b"v1".to_vec()).unwrap();
        engine.put(&key, b"v2".to_vec()).unwrap();
        assert_eq!(engine.get(&key).unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn many_keys_remain_retrievable() {
        let (_dir, mut engine) = open();
        let mut addrs = Vec::new();
        for i in 0u8..40 {
            let mut bytes = [0u8; 20];
            bytes[19] = i;
            bytes[0] = i.wrapping_mul(7);
            let addr = Address(bytes);
            let key = Nibbles::from_address(&addr);
            engine.put(&key, vec![i]).unwrap();
            addrs.push((key, vec![i]));
        }
        for (key, expected) in addrs {
            assert_eq!(engine.get(&key).unwrap(), Some(expected));
        }
    }

    #[test]
    fn reopening_after_commit_recovers_the_last_root_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let key = Nibbles::from_address(&Address([0x05; 20]));
        let root_hash = {
            let mut engine = TrieEngine::open(dir.path()).unwrap();
            engine.put(&key, b"persisted".to_vec()).unwrap();
            engine.commit();
            engine.root_hash()
        };

        let mut reopened = TrieEngine::open(dir.path()).unwrap();
        assert_eq!(reopened.root_hash(), root_hash);
        assert_eq!(reopened.get(&key).unwrap(), Some(b"persisted".to_vec()));
    }

    #[test]
    fn reopening_an_uncommitted_trie_falls_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut engine = TrieEngine::open(dir.path()).unwrap();
            let key = Nibbles::from_address(&Address([0x06; 20]));
            engine.put(&key, b"never committed".to_vec()).unwrap();
        }
        let engine = TrieEngine::open(dir.path()).unwrap();
        assert_eq!(engine.root_hash(), exec_primitives::EMPTY_TRIE_ROOT);
    }
}
