//! Level-based node cache: shallow trie levels (close to the root) are hot
//! across almost every read, so they get their own bounded LRU segment
//! instead of competing with leaf-level nodes for eviction space.
//!
//! Keyed by [`NodePointer`] rather than the node's Merkle hash: every read
//! now resolves a child through its parent's on-disk pointer (see
//! [`crate::node::Node::encode_storage`]), so the pointer is what's on hand
//! at lookup time.

use crate::node::Node;
use crate::storage::pointer::NodePointer;
use lru::LruCache;
use std::num::NonZeroUsize;

const SHALLOW_LEVEL_DEPTH: usize = 4;

pub struct NodeCache {
    shallow: LruCache<NodePointer, Node>,
    deep: LruCache<NodePointer, Node>,
}

impl NodeCache {
    pub fn new(shallow_capacity: usize, deep_capacity: usize) -> Self {
        NodeCache {
            shallow: LruCache::new(NonZeroUsize::new(shallow_capacity.max(1)).unwrap()),
            deep: LruCache::new(NonZeroUsize::new(deep_capacity.max(1)).unwrap()),
        }
    }

    pub fn get(&mut self, pointer: &NodePointer) -> Option<Node> {
        if let Some(n) = self.shallow.get(pointer) {
            return Some(n.clone());
        }
        self.deep.get(pointer).cloned()
    }

    pub fn insert(&mut self, pointer: NodePointer, node: Node, depth: usize) {
        if depth <= SHALLOW_LEVEL_DEPTH {
            self.shallow.put(pointer, node);
        } else {
            self.deep.put(pointer, node);
        }
    }
}
