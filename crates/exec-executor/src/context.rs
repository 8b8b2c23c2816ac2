//! Per-block constants the host exposes to every call frame (`ORIGIN`,
//! `COINBASE`, `TIMESTAMP`, `GASPRICE`, …) — assembled once per transaction
//! from the block header and the transaction being run.

use exec_chainspec::Header;
use exec_primitives::{Address, U256};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub gas_price: U256,
    pub origin: Address,
    pub coinbase: Address,
    pub block_number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub difficulty: U256,
    pub chain_id: u64,
    pub base_fee: Option<U256>,
    pub blob_base_fee: Option<U256>,
}

impl TxContext {
    pub fn new(header: &Header, chain_id: u64, origin: Address, gas_price: U256) -> Self {
        TxContext {
            gas_price,
            origin,
            coinbase: header.coinbase,
            block_number: header.number,
            timestamp: header.timestamp,
            gas_limit: header.gas_limit,
            difficulty: header.difficulty,
            chain_id,
            base_fee: header.base_fee_per_gas,
            blob_base_fee: None,
        }
    }
}
