//! Append-only chunked node log.
//!
//! Nodes are never mutated in place: a write appends a new record to the
//! current chunk file and hands back a [`NodePointer`]. A chunk rolls over
//! to a new file once it reaches [`CHUNK_CAPACITY_BYTES`], which keeps
//! compaction (rewriting only the chunks that still hold live records)
//! bounded in size rather than requiring a whole-log rewrite.
//!
//! On-disk record format: `[len: u32 LE][crc32: u32 LE][node bytes]`.
//!
//! Reads and writes go through an [`exec_io::NodeRing`]: `open` and the
//! one-time chunk-directory scan still use blocking `std::fs` (there's
//! nothing to overlap with), but every [`Self::append`]/[`Self::read`] on
//! the hot path submits to the ring and blocks this call only on its own
//! ticket's completion, so the same ring the fiber pool's I/O-bound work
//! uses is the one actually moving trie node bytes.

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::pointer::NodePointer;
use exec_io::{CompletionKind, NodeRing};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const CHUNK_CAPACITY_BYTES: u64 = 64 * 1024 * 1024;

/// `len` (4 bytes) + `crc32` (4 bytes) precede every record's payload.
const RECORD_HEADER_LEN: u64 = 8;

#[derive(Clone)]
struct ChunkFile {
    file: Arc<File>,
    len: u64,
}

/// Cheap to clone: every chunk's `File` handle and the ring are already
/// behind an `Arc`, so a clone shares the same open files rather than
/// reopening them. [`crate::engine::TrieEngine::snapshot`] relies on this
/// to hand a speculative transaction its own read-only log without the
/// cost of a real reopen.
#[derive(Clone)]
pub struct ChunkLog {
    dir: PathBuf,
    chunks: BTreeMap<u32, ChunkFile>,
    active_chunk_id: u32,
    ring: Arc<dyn NodeRing>,
}

impl ChunkLog {
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        let ring = exec_io::default_node_ring(32, 8)?;
        Self::open_with_ring(dir, ring)
    }

    pub fn open_with_ring(dir: impl AsRef<Path>, ring: Arc<dyn NodeRing>) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let mut chunks = BTreeMap::new();
        let mut max_id = 0u32;
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if let Some(id) = chunk_id_from_path(&entry.path()) {
                let file = OpenOptions::new().read(true).write(true).open(entry.path())?;
                let len = file.metadata()?.len();
                max_id = max_id.max(id);
                chunks.insert(id, ChunkFile { file: Arc::new(file), len });
            }
        }
        if chunks.is_empty() {
            let path = dir.join(chunk_file_name(0));
            let file = OpenOptions::new().create(true).read(true).write(true).open(path)?;
            chunks.insert(0, ChunkFile { file: Arc::new(file), len: 0 });
        }
        Ok(ChunkLog {
            dir,
            chunks,
            active_chunk_id: max_id,
            ring,
        })
    }

    /// Append a node's encoded bytes, rolling to a fresh chunk file if the
    /// active one would exceed its capacity.
    pub fn append(&mut self, bytes: &[u8]) -> StorageResult<NodePointer> {
        let record_len = RECORD_HEADER_LEN + bytes.len() as u64;
        if self.chunks[&self.active_chunk_id].len + record_len > CHUNK_CAPACITY_BYTES
            && self.chunks[&self.active_chunk_id].len > 0
        {
            self.active_chunk_id += 1;
            let path = self.dir.join(chunk_file_name(self.active_chunk_id));
            let file = OpenOptions::new().create(true).read(true).write(true).open(path)?;
            self.chunks.insert(self.active_chunk_id, ChunkFile { file: Arc::new(file), len: 0 });
        }

        let chunk = self.chunks.get_mut(&self.active_chunk_id).unwrap();
        let offset = chunk.len;

        let mut record = Vec::with_capacity(record_len as usize);
        record.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        record.extend_from_slice(&crc32fast::hash(bytes).to_le_bytes());
        record.extend_from_slice(bytes);
        ring_write(&*self.ring, chunk.file.clone(), offset, record)?;
        chunk.len += record_len;

        // Offsets are stored in 16-bit units of 4 bytes so a 64MiB chunk
        // (2^24 bytes) still fits the pointer's 16-bit offset field.
        let packed_offset = (offset / 4) as u16;
        Ok(NodePointer {
            chunk_id: self.active_chunk_id,
            offset: packed_offset,
        })
    }

    pub fn read(&mut self, pointer: NodePointer) -> StorageResult<Vec<u8>> {
        let chunk = self
            .chunks
            .get_mut(&pointer.chunk_id)
            .ok_or(StorageError::DanglingPointer(pointer))?;
        let byte_offset = pointer.offset as u64 * 4;

        let header = ring_read(&*self.ring, chunk.file.clone(), byte_offset, RECORD_HEADER_LEN as usize)?;
        let len = u32::from_le_bytes(header[0..4].try_into().unwrap()) as usize;
        let expected_crc = u32::from_le_bytes(header[4..8].try_into().unwrap());

        let data = ring_read(&*self.ring, chunk.file.clone(), byte_offset + RECORD_HEADER_LEN, len)?;
        if crc32fast::hash(&data) != expected_crc {
            return Err(StorageError::ChecksumMismatch(pointer.chunk_id));
        }
        Ok(data)
    }

    pub fn chunk_ids(&self) -> Vec<u32> {
        self.chunks.keys().copied().collect()
    }

    /// Drop a chunk file entirely. Called by compaction once every live
    /// record it held has been rewritten into a newer chunk.
    pub fn remove_chunk(&mut self, chunk_id: u32) -> StorageResult<()> {
        if chunk_id == self.active_chunk_id {
            return Ok(());
        }
        if self.chunks.remove(&chunk_id).is_some() {
            let path = self.dir.join(chunk_file_name(chunk_id));
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Submit a write and block this call (not the ring's other workers) until
/// its own ticket lands.
fn ring_write(ring: &dyn NodeRing, file: Arc<File>, offset: u64, data: Vec<u8>) -> StorageResult<()> {
    let ticket = ring.submit_write(file, offset, data)?;
    loop {
        for completion in ring.reap(16) {
            if completion.ticket == ticket {
                completion.result?;
                return Ok(());
            }
        }
        std::thread::sleep(Duration::from_micros(50));
    }
}

fn ring_read(ring: &dyn NodeRing, file: Arc<File>, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
    let ticket = ring.submit_read(file, offset, len)?;
    loop {
        for completion in ring.reap(16) {
            if completion.ticket == ticket {
                let n = completion.result?;
                let CompletionKind::Read { buffer } = completion.kind else {
                    return Err(StorageError::Io(std::io::Error::other("ring returned a write completion for a read ticket")));
                };
                let data = buffer.as_slice()[..n].to_vec();
                ring.release_buffer(buffer);
                return Ok(data);
            }
        }
        std::thread::sleep(Duration::from_micros(50));
    }
}

fn chunk_file_name(id: u32) -> String {
    format!("chunk-{id:010}.log")
}

fn chunk_id_from_path(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let digits = name.strip_prefix("chunk-")?.strip_suffix(".log")?;
    digits.parse().ok()
}
