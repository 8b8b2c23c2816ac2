//! A fiber's scheduling context: where it is allowed to run.

/// `Pinned` contexts are bound to a specific worker's main loop (used for
/// the one per-worker fiber that services local async-I/O completions).
/// `Migratable` contexts run on whichever worker next goes idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Context {
    Pinned(usize),
    Migratable,
}

/// Lower numerical values run first — transaction index doubles directly
/// as priority so commit order falls out of scheduling order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u64);

impl Priority {
    pub const HIGHEST: Priority = Priority(0);
}

impl From<u64> for Priority {
    fn from(v: u64) -> Self {
        Priority(v)
    }
}
