//! Tickets identify in-flight operations so completions can be matched
//! back to the fiber that's waiting on them.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

#[derive(Default)]
pub struct TicketSource {
    next: AtomicU64,
}

impl TicketSource {
    pub fn new() -> Self {
        TicketSource { next: AtomicU64::new(1) }
    }

    pub fn next(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
