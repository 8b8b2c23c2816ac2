//! The collaborator the executor consults for every revision-dependent
//! decision: which fork is active, what gas a transaction costs up front,
//! and header validity independent of running it.

use crate::gas::{intrinsic_gas, refund_quotient, AccessListCost};
use crate::header::{static_validate_header, validate_against_parent, Header, HeaderError};
use crate::revision::{ForkSchedule, Revision};

pub struct ChainSpec {
    pub chain_id: u64,
    pub fork_schedule: ForkSchedule,
}

impl ChainSpec {
    pub fn mainnet_shaped(chain_id: u64) -> Self {
        ChainSpec {
            chain_id,
            fork_schedule: ForkSchedule {
                activations: Revision::ALL_ASCENDING
                    .iter()
                    .enumerate()
                    .map(|(i, rev)| (i as u64 * 1_000_000, *rev))
                    .collect(),
            },
        }
    }

    pub fn revision_at(&self, block_number: u64) -> Revision {
        self.fork_schedule.revision_at(block_number)
    }

    pub fn intrinsic_gas(
        &self,
        block_number: u64,
        data: &[u8],
        is_contract_creation: bool,
        access_list: Option<AccessListCost>,
    ) -> u64 {
        intrinsic_gas(data, is_contract_creation, access_list, self.revision_at(block_number))
    }

    pub fn refund_quotient(&self, block_number: u64) -> u64 {
        refund_quotient(self.revision_at(block_number))
    }

    pub fn static_validate_header(&self, header: &Header) -> Result<(), HeaderError> {
        static_validate_header(header)
    }

    pub fn validate_output_header(&self, header: &Header, parent: &Header) -> Result<(), HeaderError> {
        static_validate_header(header)?;
        validate_against_parent(header, parent)
    }
}
