//! Chunk-granular compaction: once every version that could still reference
//! a chunk has aged out of the [`super::version_index::VersionIndex`], the
//! chunk is reclaimed as a unit rather than garbage-collecting individual
//! node records within it.

use crate::node::Node;
use crate::storage::chunk_log::ChunkLog;
use crate::storage::error::StorageResult;
use crate::storage::pointer::NodePointer;
use std::collections::HashSet;

/// A chunk is eligible for reclamation once none of its records are
/// reachable from any retained version's root. `live_roots` is the set of
/// root pointers for every version still inside the retention window. Each
/// visited node's children come straight out of its own on-disk record
/// (`Node::decode_storage`), so walking reachability never needs a
/// separate hash-to-pointer index.
pub fn reachable_chunks(log: &mut ChunkLog, live_roots: &[NodePointer]) -> StorageResult<HashSet<u32>> {
    let mut reachable = HashSet::new();
    let mut stack: Vec<NodePointer> = live_roots.to_vec();
    let mut visited = HashSet::new();

    while let Some(ptr) = stack.pop() {
        if ptr.is_null() || !visited.insert(ptr) {
            continue;
        }
        reachable.insert(ptr.chunk_id);
        let bytes = log.read(ptr)?;
        let node = Node::decode_storage(&bytes)?;
        for child_ptr in node_child_pointers(&node) {
            stack.push(child_ptr);
        }
    }
    Ok(reachable)
}

fn node_child_pointers(node: &Node) -> Vec<NodePointer> {
    match node {
        Node::Empty | Node::Leaf { .. } => Vec::new(),
        Node::Branch { children, .. } => children.iter().filter_map(|c| c.map(|c| c.pointer)).collect(),
    }
}

/// Delete every on-disk chunk not present in `reachable`, skipping the
/// active (currently-being-written) chunk.
pub fn sweep(log: &mut ChunkLog, reachable: &HashSet<u32>) -> StorageResult<usize> {
    let mut removed = 0;
    for chunk_id in log.chunk_ids() {
        if !reachable.contains(&chunk_id) {
            log.remove_chunk(chunk_id)?;
            removed += 1;
        }
    }
    Ok(removed)
}
