//! Hard-fork revisions, ordered so later forks compare greater — the gas
//! schedule and validation rules look up "is this fork active at block N"
//! by comparing against the chain's configured activation table.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Revision {
    Frontier,
    Homestead,
    Byzantium,
    Constantinople,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
}

impl Revision {
    pub const ALL_ASCENDING: [Revision; 10] = [
        Revision::Frontier,
        Revision::Homestead,
        Revision::Byzantium,
        Revision::Constantinople,
        Revision::Istanbul,
        Revision::Berlin,
        Revision::London,
        Revision::Paris,
        Revision::Shanghai,
        Revision::Cancun,
    ];

    pub fn at_least(self, other: Revision) -> bool {
        self >= other
    }
}

/// Maps block timestamps/numbers to the active revision. Mainnet-shaped by
/// default; a chain spec for a different network constructs its own table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForkSchedule {
    /// (activation block number, revision), sorted ascending.
    pub activations: Vec<(u64, Revision)>,
}

impl ForkSchedule {
    pub fn revision_at(&self, block_number: u64) -> Revision {
        self.activations
            .iter()
            .rev()
            .find(|(activation, _)| block_number >= *activation)
            .map(|(_, rev)| *rev)
            .unwrap_or(Revision::Frontier)
    }
}
