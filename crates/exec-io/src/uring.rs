//! `io_uring`-backed ring for Linux. Submission is the owning worker's
//! responsibility (the spec's "producer-only from the owning thread" rule);
//! `reap` drains whatever completions the kernel has already posted,
//! matching the portable backend's non-blocking `try_recv` semantics.

use crate::buffer::{Buffer, BufferPool, PoolKind};
use crate::completion::{Completion, CompletionKind};
use crate::error::{IoRingError, IoRingResult};
use crate::ticket::{Ticket, TicketSource};
use io_uring::{opcode, types, IoUring};
use std::collections::HashMap;
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::sync::{Arc, Mutex};

enum Pending {
    Read { buffer: Buffer },
    Write { _data: Vec<u8> },
}

pub struct UringRing {
    ring: Mutex<IoUring>,
    pending: Mutex<HashMap<u64, Pending>>,
    tickets: TicketSource,
    read_pool: Arc<BufferPool>,
    /// Submitted files must outlive the in-flight operation; `io_uring`
    /// only takes a raw fd, so this keeps the `File` alive until reaped.
    held_files: Mutex<HashMap<u64, Arc<File>>>,
}

impl UringRing {
    pub fn new(queue_depth: u32, buffer_slots: usize) -> IoRingResult<Self> {
        let ring = IoUring::new(queue_depth).map_err(IoRingError::Io)?;
        Ok(UringRing {
            ring: Mutex::new(ring),
            pending: Mutex::new(HashMap::new()),
            tickets: TicketSource::new(),
            read_pool: Arc::new(BufferPool::new(PoolKind::ReadWrite, buffer_slots)),
            held_files: Mutex::new(HashMap::new()),
        })
    }

    pub fn submit_read(&self, file: Arc<File>, offset: u64, len: usize) -> IoRingResult<Ticket> {
        let mut buffer = self.read_pool.acquire()?;
        let take = len.min(buffer.data.len());
        buffer.data.resize(take, 0);
        let ticket = self.tickets.next();
        let fd = types::Fd(file.as_raw_fd());
        let entry = opcode::Read::new(fd, buffer.data.as_mut_ptr(), take as u32)
            .offset(offset)
            .build()
            .user_data(ticket.0);

        {
            let mut ring = self.ring.lock().unwrap();
            unsafe {
                ring.submission()
                    .push(&entry)
                    .map_err(|_| IoRingError::SubmissionQueueFull)?;
            }
            ring.submit().map_err(IoRingError::Io)?;
        }
        self.pending.lock().unwrap().insert(ticket.0, Pending::Read { buffer });
        self.held_files.lock().unwrap().insert(ticket.0, file);
        Ok(ticket)
    }

    pub fn submit_write(&self, file: Arc<File>, offset: u64, data: Vec<u8>) -> IoRingResult<Ticket> {
        let ticket = self.tickets.next();
        let fd = types::Fd(file.as_raw_fd());
        let entry = opcode::Write::new(fd, data.as_ptr(), data.len() as u32)
            .offset(offset)
            .build()
            .user_data(ticket.0);

        {
            let mut ring = self.ring.lock().unwrap();
            unsafe {
                ring.submission()
                    .push(&entry)
                    .map_err(|_| IoRingError::SubmissionQueueFull)?;
            }
            ring.submit().map_err(IoRingError::Io)?;
        }
        self.pending.lock().unwrap().insert(ticket.0, Pending::Write { _data: data });
        self.held_files.lock().unwrap().insert(ticket.0, file);
        Ok(ticket)
    }

    pub fn reap(&self, budget: usize) -> Vec<Completion> {
        let mut out = Vec::new();
        let mut ring = self.ring.lock().unwrap();
        let _ = ring.submit();
        for cqe in ring.completion().take(budget) {
            let user_data = cqe.user_data();
            let result = cqe.result();
            let ticket = Ticket(user_data);
            let mut pending = self.pending.lock().unwrap();
            let Some(entry) = pending.remove(&user_data) else { continue };
            self.held_files.lock().unwrap().remove(&user_data);
            let io_result = if result < 0 {
                Err(std::io::Error::from_raw_os_error(-result))
            } else {
                Ok(result as usize)
            };
            let kind = match entry {
                Pending::Read { buffer } => CompletionKind::Read { buffer },
                Pending::Write { .. } => CompletionKind::Write,
            };
            out.push(Completion { ticket, result: io_result, kind });
        }
        out
    }

    pub fn release_buffer(&self, buffer: Buffer) {
        self.read_pool.release(buffer);
    }
}
