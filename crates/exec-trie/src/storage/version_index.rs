//! Ring buffer mapping recent versions to their root node, so a reader can
//! resolve "state as of version V" without walking the whole log. Sized to
//! roughly one slot per block at a dense chain's per-second production
//! rate over a four-hour retention window before a version ages out.

use crate::storage::pointer::NodePointer;
use exec_primitives::Hash256;

pub const SLOTS: usize = 14_400;

#[derive(Clone, Copy, Debug)]
pub struct VersionEntry {
    pub version: u64,
    pub root_pointer: NodePointer,
    pub root_hash: Hash256,
}

pub struct VersionIndex {
    slots: Box<[Option<VersionEntry>; SLOTS]>,
    latest: Option<u64>,
}

impl VersionIndex {
    pub fn new() -> Self {
        VersionIndex {
            slots: Box::new([None; SLOTS]),
            latest: None,
        }
    }

    pub fn record(&mut self, version: u64, root_pointer: NodePointer, root_hash: Hash256) {
        let slot = (version as usize) % SLOTS;
        self.slots[slot] = Some(VersionEntry {
            version,
            root_pointer,
            root_hash,
        });
        self.latest = Some(self.latest.map_or(version, |l| l.max(version)));
    }

    /// Look up a version's root. Returns `None` both when the version was
    /// never recorded and when it has aged out of the ring (overwritten by
    /// a later version landing on the same slot) — callers distinguish the
    /// latter by comparing against `oldest_retained`.
    pub fn get(&self, version: u64) -> Option<VersionEntry> {
        let slot = (version as usize) % SLOTS;
        self.slots[slot].filter(|e| e.version == version)
    }

    pub fn latest(&self) -> Option<u64> {
        self.latest
    }

    pub fn oldest_retained(&self) -> Option<u64> {
        let latest = self.latest?;
        Some(latest.saturating_sub(SLOTS as u64 - 1).max(0))
    }

    /// Root pointers for every version still held in the ring. Compaction's
    /// reachability walk starts from these — a version still occupying a
    /// slot is, by construction, within the retention window.
    pub fn live_roots(&self) -> Vec<NodePointer> {
        self.slots.iter().filter_map(|slot| slot.map(|e| e.root_pointer)).collect()
    }
}

impl Default for VersionIndex {
    fn default() -> Self {
        Self::new()
    }
}
