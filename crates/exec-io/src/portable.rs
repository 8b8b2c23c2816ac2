//! Portable fallback ring: dispatches synchronous `pread`/`pwrite`
//! (`read_at`/`write_at`) onto a small thread pool and exposes the same
//! ticket/reap interface as the `io_uring` backend, so callers (`exec-trie`,
//! tests) don't need platform-specific code paths.

use crate::buffer::{Buffer, BufferPool, PoolKind};
use crate::completion::{Completion, CompletionKind};
use crate::error::IoRingResult;
use crate::ticket::{Ticket, TicketSource};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::File;
use std::sync::{Arc, Mutex};

#[cfg(unix)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(unix)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.write_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, offset: u64, buf: &mut [u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(windows)]
fn write_at(file: &File, offset: u64, buf: &[u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_write(buf, offset)
}

enum Job {
    Read { ticket: Ticket, file: Arc<File>, offset: u64, buffer: Buffer },
    Write { ticket: Ticket, file: Arc<File>, offset: u64, data: Vec<u8> },
}

pub struct PortableRing {
    tickets: TicketSource,
    read_pool: Arc<BufferPool>,
    job_tx: Sender<Job>,
    done_rx: Receiver<Completion>,
    _workers: Vec<std::thread::JoinHandle<()>>,
}

impl PortableRing {
    pub fn new(worker_count: usize, buffer_slots: usize) -> Self {
        let read_pool = Arc::new(BufferPool::new(PoolKind::ReadWrite, buffer_slots));
        let (job_tx, job_rx) = bounded::<Job>(buffer_slots.max(1) * 4);
        let (done_tx, done_rx) = bounded::<Completion>(buffer_slots.max(1) * 4);
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                std::thread::spawn(move || loop {
                    let job = { job_rx.lock().unwrap().recv() };
                    let Ok(job) = job else { break };
                    let completion = match job {
                        Job::Read { ticket, file, offset, mut buffer } => {
                            let result = read_at(&file, offset, buffer.as_mut_slice());
                            Completion { ticket, result, kind: CompletionKind::Read { buffer } }
                        }
                        Job::Write { ticket, file, offset, data } => {
                            let result = write_at(&file, offset, &data);
                            Completion { ticket, result, kind: CompletionKind::Write }
                        }
                    };
                    if done_tx.send(completion).is_err() {
                        break;
                    }
                })
            })
            .collect();

        PortableRing {
            tickets: TicketSource::new(),
            read_pool,
            job_tx,
            done_rx,
            _workers: workers,
        }
    }

    pub fn submit_read(&self, file: Arc<File>, offset: u64, len: usize) -> IoRingResult<Ticket> {
        let mut buffer = self.read_pool.acquire()?;
        buffer.data.resize(len.min(buffer.data.len()), 0);
        let ticket = self.tickets.next();
        self.job_tx
            .send(Job::Read { ticket, file, offset, buffer })
            .map_err(|_| crate::error::IoRingError::SubmissionQueueFull)?;
        Ok(ticket)
    }

    pub fn submit_write(&self, file: Arc<File>, offset: u64, data: Vec<u8>) -> IoRingResult<Ticket> {
        let ticket = self.tickets.next();
        self.job_tx
            .send(Job::Write { ticket, file, offset, data })
            .map_err(|_| crate::error::IoRingError::SubmissionQueueFull)?;
        Ok(ticket)
    }

    /// Drains up to `budget` completions without blocking past what's
    /// already finished.
    pub fn reap(&self, budget: usize) -> Vec<Completion> {
        let mut out = Vec::new();
        while out.len() < budget {
            match self.done_rx.try_recv() {
                Ok(completion) => out.push(completion),
                Err(_) => break,
            }
        }
        out
    }

    pub fn release_buffer(&self, buffer: Buffer) {
        self.read_pool.release(buffer);
    }
}
