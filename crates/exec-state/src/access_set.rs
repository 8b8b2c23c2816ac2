//! Tracks what a transaction read and wrote, both for pairwise conflict
//! detection across a scheduled batch and for live validation of a single
//! transaction against everything already merged into the block.

use exec_primitives::{Address, Hash256};

/// A storage slot access: `None` in the key position means "the account
/// record itself" rather than one of its storage slots.
pub type AccessKey = (Address, Option<Hash256>);

#[derive(Clone, Debug, Default)]
pub struct AccessSet {
    pub reads: Vec<AccessKey>,
    pub writes: Vec<AccessKey>,
}

impl AccessSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&mut self, address: Address, slot: Option<Hash256>) {
        self.reads.push((address, slot));
    }

    pub fn record_write(&mut self, address: Address, slot: Option<Hash256>) {
        self.writes.push((address, slot));
    }

    /// True if this access set's writes or reads touch anything `other`
    /// wrote — the two transactions cannot both be retained in-order
    /// without re-executing one of them.
    pub fn conflicts_with(&self, other: &AccessSet) -> bool {
        self.writes.iter().any(|w| other.writes.contains(w))
            || self.writes.iter().any(|w| other.reads.contains(w))
            || self.reads.iter().any(|r| other.writes.contains(r))
    }

    /// True if nothing this access set read was written by `already_merged`
    /// — i.e. the transaction that produced it wouldn't have observed
    /// different values had it run after every already-merged transaction,
    /// so its buffered writes can be folded into the block as-is instead of
    /// re-executed.
    pub fn can_merge_after(&self, already_merged: &AccessSet) -> bool {
        !self.reads.iter().any(|r| already_merged.writes.contains(r))
    }

    /// Extend this set's writes with another's — used to fold a just-merged
    /// transaction's writes into the running `already_merged` set that
    /// gates the next transaction's [`Self::can_merge_after`] check.
    pub fn absorb_writes(&mut self, other: &AccessSet) {
        self.writes.extend(other.writes.iter().copied());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    ReadWrite,
    WriteWrite,
}

#[derive(Clone, Debug)]
pub struct Conflict {
    pub earlier_index: usize,
    pub later_index: usize,
    pub kind: ConflictKind,
    pub address: Address,
    pub slot: Option<Hash256>,
}

/// Pairwise conflict scan across a scheduled batch, used by the fiber
/// scheduler to decide which speculatively-executed transactions can keep
/// their result and which must re-execute after a conflicting earlier one
/// commits.
pub fn detect_conflicts(sets: &[AccessSet]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            for &(addr, slot) in &sets[i].writes {
                if sets[j].writes.contains(&(addr, slot)) {
                    conflicts.push(Conflict {
                        earlier_index: i,
                        later_index: j,
                        kind: ConflictKind::WriteWrite,
                        address: addr,
                        slot,
                    });
                }
            }
            for &(addr, slot) in &sets[i].writes {
                if sets[j].reads.contains(&(addr, slot)) {
                    conflicts.push(Conflict {
                        earlier_index: i,
                        later_index: j,
                        kind: ConflictKind::ReadWrite,
                        address: addr,
                        slot,
                    });
                }
            }
        }
    }
    conflicts
}
