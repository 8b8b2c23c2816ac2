//! # Execution Async I/O Ring
//!
//! A ticket-based async I/O interface: `submit_read`/`submit_write` return
//! a [`Ticket`] immediately, `reap` drains whatever completions are ready.
//! Backed by `io_uring` on Linux; a portable thread-pool fallback services
//! the identical shape everywhere else so `exec-trie` and the workspace
//! tests don't need platform-specific code.
//!
//! Ordering: writes to disjoint offsets are unordered with respect to each
//! other; a caller with a write-after-write dependency on the same region
//! must wait for the first ticket's completion before submitting the
//! second.

pub mod buffer;
pub mod completion;
pub mod error;
pub mod portable;
pub mod ticket;

#[cfg(target_os = "linux")]
pub mod uring;

use std::fs::File;
use std::sync::Arc;

pub use buffer::{Buffer, BufferPool, PoolKind, BUFFER_SIZE};
pub use completion::{Completion, CompletionKind};
pub use error::{IoRingError, IoRingResult};
pub use portable::PortableRing;
pub use ticket::{Ticket, TicketSource};

#[cfg(target_os = "linux")]
pub use uring::UringRing;

/// The submit/reap shape both ring backends expose, as a trait object so a
/// caller (`exec-trie`'s chunk log, in particular) can hold one ring
/// without compiling two code paths for Linux and everywhere else.
pub trait NodeRing: Send + Sync {
    fn submit_read(&self, file: Arc<File>, offset: u64, len: usize) -> IoRingResult<Ticket>;
    fn submit_write(&self, file: Arc<File>, offset: u64, data: Vec<u8>) -> IoRingResult<Ticket>;
    fn reap(&self, budget: usize) -> Vec<Completion>;
    fn release_buffer(&self, buffer: Buffer);
}

impl NodeRing for PortableRing {
    fn submit_read(&self, file: Arc<File>, offset: u64, len: usize) -> IoRingResult<Ticket> {
        PortableRing::submit_read(self, file, offset, len)
    }
    fn submit_write(&self, file: Arc<File>, offset: u64, data: Vec<u8>) -> IoRingResult<Ticket> {
        PortableRing::submit_write(self, file, offset, data)
    }
    fn reap(&self, budget: usize) -> Vec<Completion> {
        PortableRing::reap(self, budget)
    }
    fn release_buffer(&self, buffer: Buffer) {
        PortableRing::release_buffer(self, buffer)
    }
}

#[cfg(target_os = "linux")]
impl NodeRing for UringRing {
    fn submit_read(&self, file: Arc<File>, offset: u64, len: usize) -> IoRingResult<Ticket> {
        UringRing::submit_read(self, file, offset, len)
    }
    fn submit_write(&self, file: Arc<File>, offset: u64, data: Vec<u8>) -> IoRingResult<Ticket> {
        UringRing::submit_write(self, file, offset, data)
    }
    fn reap(&self, budget: usize) -> Vec<Completion> {
        UringRing::reap(self, budget)
    }
    fn release_buffer(&self, buffer: Buffer) {
        UringRing::release_buffer(self, buffer)
    }
}

/// Construct the best ring for the current platform: `io_uring` on Linux,
/// the portable thread-pool fallback everywhere else.
#[cfg(target_os = "linux")]
pub fn default_ring(queue_depth: u32, buffer_slots: usize) -> IoRingResult<UringRing> {
    UringRing::new(queue_depth, buffer_slots)
}

#[cfg(not(target_os = "linux"))]
pub fn default_ring(_queue_depth: u32, buffer_slots: usize) -> IoRingResult<PortableRing> {
    Ok(PortableRing::new(num_cpus_fallback(), buffer_slots))
}

/// [`default_ring`], boxed as a [`NodeRing`] trait object so callers that
/// don't care which backend they got (every caller but `exec-node`'s own
/// construction of the field it reports in health checks) can hold one
/// type regardless of platform.
pub fn default_node_ring(queue_depth: u32, buffer_slots: usize) -> IoRingResult<Arc<dyn NodeRing>> {
    Ok(Arc::new(default_ring(queue_depth, buffer_slots)?))
}

#[cfg(not(target_os = "linux"))]
fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
