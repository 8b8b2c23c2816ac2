//! Block header fields this crate validates independent of execution
//! (Yellow Paper §4.3.4's header-only checks) — full state-root/gas-used
//! cross-checks happen in the executor after a block actually runs.

use exec_crypto::keccak256;
use exec_primitives::{Address, Hash256, U256};
use exec_rlp::decode::{Decodable, Rlp};
use exec_rlp::encode::{Encodable, ListEncoder};
use exec_rlp::RlpResult;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

/// Fields the executor fills in only after running the block; present here
/// so the same `Header` type is both the header-only validation subject and
/// the canonical RLP shape the executor checks its results against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub parent_hash: Hash256,
    pub ommers_hash: Hash256,
    pub coinbase: Address,
    pub state_root: Hash256,
    pub transactions_root: Hash256,
    pub receipts_root: Hash256,
    #[serde(with = "BigArray")]
    pub logs_bloom: [u8; 256],
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub extra_data: Vec<u8>,
    pub mix_hash: Hash256,
    pub nonce: [u8; 8],
    pub base_fee_per_gas: Option<U256>,
    pub withdrawals_root: Option<Hash256>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("gas used {gas_used} exceeds gas limit {gas_limit}")]
    GasUsedExceedsLimit { gas_used: u64, gas_limit: u64 },

    #[error("timestamp {timestamp} does not advance past parent timestamp {parent_timestamp}")]
    TimestampNotIncreasing { timestamp: u64, parent_timestamp: u64 },

    #[error("block number {number} is not parent's {parent_number} + 1")]
    NumberNotSequential { number: u64, parent_number: u64 },

    #[error("extra_data is {len} bytes, exceeding the 32-byte limit")]
    ExtraDataTooLong { len: usize },

    #[error("gas limit {gas_limit} changed by more than 1/1024 of parent's {parent_gas_limit}")]
    GasLimitDeviatesTooMuch { gas_limit: u64, parent_gas_limit: u64 },
}

impl Header {
    /// The header's canonical identity: `keccak256` of its own RLP encoding.
    /// Distinct from `state_root` — this hashes the header itself, not the
    /// state it commits to, and is what `BLOCKHASH` and `parent_hash` chain
    /// together.
    pub fn hash(&self) -> Hash256 {
        keccak256(&self.rlp_encode())
    }
}

/// Checks independent of the parent header — currently just internal
/// consistency of the header's own fields.
pub fn static_validate_header(header: &Header) -> Result<(), HeaderError> {
    if header.gas_used > header.gas_limit {
        return Err(HeaderError::GasUsedExceedsLimit {
            gas_used: header.gas_used,
            gas_limit: header.gas_limit,
        });
    }
    if header.extra_data.len() > 32 {
        return Err(HeaderError::ExtraDataTooLong {
            len: header.extra_data.len(),
        });
    }
    Ok(())
}

/// Checks requiring the parent header (sequencing, gas limit drift,
/// monotonic timestamp).
pub fn validate_against_parent(header: &Header, parent: &Header) -> Result<(), HeaderError> {
    if header.number != parent.number + 1 {
        return Err(HeaderError::NumberNotSequential {
            number: header.number,
            parent_number: parent.number,
        });
    }
    if header.timestamp <= parent.timestamp {
        return Err(HeaderError::TimestampNotIncreasing {
            timestamp: header.timestamp,
            parent_timestamp: parent.timestamp,
        });
    }
    let max_delta = parent.gas_limit / 1024;
    let delta = header.gas_limit.abs_diff(parent.gas_limit);
    if delta > max_delta {
        return Err(HeaderError::GasLimitDeviatesTooMuch {
            gas_limit: header.gas_limit,
            parent_gas_limit: parent.gas_limit,
        });
    }
    Ok(())
}

impl Encodable for Header {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        let mut encoder = ListEncoder::new()
            .field(&self.parent_hash)
            .field(&self.ommers_hash)
            .field(&self.coinbase)
            .field(&self.state_root)
            .field(&self.transactions_root)
            .field(&self.receipts_root)
            .raw_field(&{
                let mut b = Vec::new();
                exec_rlp::encode::encode_bytes(&self.logs_bloom, &mut b);
                b
            })
            .field(&self.difficulty)
            .field(&self.number)
            .field(&self.gas_limit)
            .field(&self.gas_used)
            .field(&self.timestamp)
            .field(&self.extra_data)
            .field(&self.mix_hash)
            .raw_field(&{
                let mut b = Vec::new();
                exec_rlp::encode::encode_bytes(&self.nonce, &mut b);
                b
            });
        if let Some(base_fee) = &self.base_fee_per_gas {
            encoder = encoder.field(base_fee);
        }
        if let Some(withdrawals_root) = &self.withdrawals_root {
            encoder = encoder.field(withdrawals_root);
        }
        encoder.finish(out);
    }
}

impl Decodable for Header {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let mut list = rlp.list()?;
        let parent_hash = Hash256::rlp_decode(&mut list)?;
        let ommers_hash = Hash256::rlp_decode(&mut list)?;
        let coinbase = Address::rlp_decode(&mut list)?;
        let state_root = Hash256::rlp_decode(&mut list)?;
        let transactions_root = Hash256::rlp_decode(&mut list)?;
        let receipts_root = Hash256::rlp_decode(&mut list)?;
        let bloom_bytes = list.bytes()?;
        let mut logs_bloom = [0u8; 256];
        logs_bloom.copy_from_slice(bloom_bytes);
        let difficulty = list.u256()?;
        let number = list.u64()?;
        let gas_limit = list.u64()?;
        let gas_used = list.u64()?;
        let timestamp = list.u64()?;
        let extra_data = Vec::rlp_decode(&mut list)?;
        let mix_hash = Hash256::rlp_decode(&mut list)?;
        let nonce_bytes = list.bytes()?;
        let mut nonce = [0u8; 8];
        nonce.copy_from_slice(nonce_bytes);
        let base_fee_per_gas = if !list.remaining().is_empty() { Some(list.u256()?) } else { None };
        let withdrawals_root = if !list.remaining().is_empty() { Some(Hash256::rlp_decode(&mut list)?) } else { None };
        Ok(Header {
            parent_hash,
            ommers_hash,
            coinbase,
            state_root,
            transactions_root,
            receipts_root,
            logs_bloom,
            difficulty,
            number,
            gas_limit,
            gas_used,
            timestamp,
            extra_data,
            mix_hash,
            nonce,
            base_fee_per_gas,
            withdrawals_root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(number: u64, timestamp: u64, gas_limit: u64, gas_used: u64) -> Header {
        Header {
            parent_hash: Hash256::ZERO,
            ommers_hash: Hash256::ZERO,
            coinbase: Address::ZERO,
            state_root: Hash256::ZERO,
            transactions_root: Hash256::ZERO,
            receipts_root: Hash256::ZERO,
            logs_bloom: [0u8; 256],
            difficulty: U256::ZERO,
            number,
            timestamp,
            gas_limit,
            gas_used,
            extra_data: Vec::new(),
            mix_hash: Hash256::ZERO,
            nonce: [0u8; 8],
            base_fee_per_gas: None,
            withdrawals_root: None,
        }
    }

    #[test]
    fn rejects_gas_used_over_limit() {
        let h = header(1, 1, 1000, 2000);
        assert_eq!(
            static_validate_header(&h),
            Err(HeaderError::GasUsedExceedsLimit {
                gas_used: 2000,
                gas_limit: 1000
            })
        );
    }

    #[test]
    fn rejects_non_sequential_number() {
        let parent = header(5, 10, 1000, 0);
        let child = header(7, 11, 1000, 0);
        assert!(validate_against_parent(&child, &parent).is_err());
    }

    #[test]
    fn accepts_valid_sequence() {
        let parent = header(5, 10, 1_000_000, 0);
        let child = header(6, 11, 1_000_500, 0);
        assert!(validate_against_parent(&child, &parent).is_ok());
    }

    #[test]
    fn header_round_trips_through_rlp_with_optional_fields() {
        let mut h = header(10, 20, 30_000_000, 21_000);
        h.base_fee_per_gas = Some(U256::from_u64(7));
        h.withdrawals_root = Some(Hash256([9u8; 32]));
        let encoded = h.rlp_encode();
        let decoded = Header::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn pre_shanghai_header_round_trips_without_optional_fields() {
        let h = header(10, 20, 30_000_000, 21_000);
        let encoded = h.rlp_encode();
        let decoded = Header::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, h);
    }

    #[test]
    fn hash_differs_from_state_root_and_changes_with_content() {
        let mut h = header(10, 20, 30_000_000, 21_000);
        h.state_root = Hash256([7u8; 32]);
        let hash = h.hash();
        assert_ne!(hash, h.state_root);
        h.gas_used = 21_001;
        assert_ne!(h.hash(), hash);
    }
}
