//! Intrinsic gas accounting and the EIP-3529 refund cap, computed per the
//! active [`crate::revision::Revision`].

use crate::revision::Revision;

pub const TX_BASE_GAS: u64 = 21_000;
pub const TX_CREATE_GAS: u64 = 32_000;
pub const TX_DATA_ZERO_GAS: u64 = 4;
pub const TX_DATA_NONZERO_GAS_FRONTIER: u64 = 68;
pub const TX_DATA_NONZERO_GAS_ISTANBUL: u64 = 16;
pub const ACCESS_LIST_ADDRESS_GAS: u64 = 2_400;
pub const ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1_900;
pub const TX_CREATE_WORD_GAS_SHANGHAI: u64 = 2;

/// EIP-3529 (London): refunds are capped at gas_used/5, down from the
/// original EIP-2200 (pre-London) cap of gas_used/2.
pub fn refund_quotient(revision: Revision) -> u64 {
    if revision.at_least(Revision::London) {
        5
    } else {
        2
    }
}

pub fn calldata_gas(data: &[u8], revision: Revision) -> u64 {
    let nonzero_cost = if revision.at_least(Revision::Istanbul) {
        TX_DATA_NONZERO_GAS_ISTANBUL
    } else {
        TX_DATA_NONZERO_GAS_FRONTIER
    };
    let zero_count = data.iter().filter(|&&b| b == 0).count() as u64;
    let nonzero_count = data.len() as u64 - zero_count;
    zero_count * TX_DATA_ZERO_GAS + nonzero_count * nonzero_cost
}

/// Number of 32-byte words in `init_code`, rounded up — the unit
/// EIP-3860 (Shanghai) charges per-word initcode gas against.
pub fn initcode_word_count(init_code_len: usize) -> u64 {
    ((init_code_len + 31) / 32) as u64
}

pub struct AccessListCost {
    pub addresses: u64,
    pub storage_keys: u64,
}

/// `g_transaction` from the Yellow Paper, generalized across forks: base
/// cost, calldata cost, EIP-2930 access-list cost, and EIP-2 contract
/// creation surcharge plus EIP-3860 initcode word cost.
pub fn intrinsic_gas(
    data: &[u8],
    is_contract_creation: bool,
    access_list: Option<AccessListCost>,
    revision: Revision,
) -> u64 {
    let mut gas = TX_BASE_GAS;
    gas += calldata_gas(data, revision);
    if is_contract_creation {
        gas += TX_CREATE_GAS;
        if revision.at_least(Revision::Shanghai) {
            gas += initcode_word_count(data.len()) * TX_CREATE_WORD_GAS_SHANGHAI;
        }
    }
    if let Some(list) = access_list {
        gas += list.addresses * ACCESS_LIST_ADDRESS_GAS;
        gas += list.storage_keys * ACCESS_LIST_STORAGE_KEY_GAS;
    }
    gas
}

/// EIP-7623 (Cancun+ calldata floor): a transaction pays at least this much
/// regardless of how little other gas it consumes, so deliberately cheap
/// calldata-only spam can't undercut the true DA cost.
pub fn floor_data_gas(data: &[u8], revision: Revision) -> u64 {
    if !revision.at_least(Revision::Cancun) {
        return 0;
    }
    let zero_count = data.iter().filter(|&&b| b == 0).count() as u64;
    let nonzero_count = data.len() as u64 - zero_count;
    const TOKENS_PER_NONZERO: u64 = 4;
    const FLOOR_PER_TOKEN: u64 = 10;
    TX_BASE_GAS + (zero_count + nonzero_count * TOKENS_PER_NONZERO) * FLOOR_PER_TOKEN
}
