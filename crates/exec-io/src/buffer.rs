//! Fixed-size buffer pools backing ring reads/writes. Two pools —
//! read-only (populated once, handed out for writes of already-committed
//! data) and read-write (reused across both directions) — each carved
//! into `BUFFER_SIZE` huge-page-sized slices, `mlock`-pinned on unix so
//! the pages can't be swapped out from under an in-flight kernel I/O.

use crate::error::{IoRingError, IoRingResult};
use std::sync::Mutex;

/// 2 MiB matches the common Linux huge-page size; each buffer slot is one
/// page so a single `mlock` call per slot pins exactly one page.
pub const BUFFER_SIZE: usize = 2 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolKind {
    ReadOnly,
    ReadWrite,
}

pub struct Buffer {
    pub data: Vec<u8>,
    pub kind: PoolKind,
    index: usize,
}

impl Buffer {
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

struct Slot {
    data: Vec<u8>,
    in_use: bool,
}

pub struct BufferPool {
    kind: PoolKind,
    slots: Mutex<Vec<Slot>>,
}

impl BufferPool {
    pub fn new(kind: PoolKind, capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| Slot { data: allocate_pinned(BUFFER_SIZE), in_use: false })
            .collect();
        BufferPool { kind, slots: Mutex::new(slots) }
    }

    pub fn acquire(&self) -> IoRingResult<Buffer> {
        let mut slots = self.slots.lock().unwrap();
        let capacity = slots.len();
        for (index, slot) in slots.iter_mut().enumerate() {
            if !slot.in_use {
                slot.in_use = true;
                return Ok(Buffer { data: std::mem::take(&mut slot.data), kind: self.kind, index });
            }
        }
        Err(IoRingError::PoolExhausted { capacity })
    }

    pub fn release(&self, mut buffer: Buffer) {
        let mut slots = self.slots.lock().unwrap();
        if let Some(slot) = slots.get_mut(buffer.index) {
            buffer.data.clear();
            buffer.data.resize(BUFFER_SIZE, 0);
            slot.data = std::mem::take(&mut buffer.data);
            slot.in_use = false;
        }
    }
}

#[cfg(unix)]
fn allocate_pinned(size: usize) -> Vec<u8> {
    let buf = vec![0u8; size];
    // Best-effort: a failed mlock (e.g. RLIMIT_MEMLOCK too low in a
    // container) degrades to ordinary swappable memory rather than erroring
    // the whole pool out, since correctness doesn't depend on pinning.
    unsafe {
        libc::mlock(buf.as_ptr() as *const libc::c_void, buf.len());
    }
    buf
}

#[cfg(not(unix))]
fn allocate_pinned(size: usize) -> Vec<u8> {
    vec![0u8; size]
}
