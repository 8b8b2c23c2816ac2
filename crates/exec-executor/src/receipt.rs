//! Receipts and their 2048-bit logs bloom. A receipt encodes as
//! `[status, cumulative_gas_used, bloom, logs]`; legacy receipts are a bare
//! RLP list inside the receipts trie, typed receipts are wrapped as an RLP
//! string the same way typed transactions are when embedded in a list.

use crate::transaction::TxType;
use exec_crypto::keccak256;
use exec_evm_host::Log;
use exec_primitives::{Address, Hash256};
use exec_rlp::decode::{Decodable, Rlp};
use exec_rlp::encode::{Encodable, ListEncoder};
use exec_rlp::{RlpError, RlpResult};

pub const BLOOM_BYTES: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bloom(pub [u8; BLOOM_BYTES]);

impl Bloom {
    pub fn empty() -> Self {
        Bloom([0u8; BLOOM_BYTES])
    }

    /// The "set 3 bits" rule: for `data`, hash it, then for each of the
    /// three big-endian u16s at byte offsets 0/2/4 of the hash, set bit
    /// `2047 - (value % 2048)`.
    pub fn accrue(&mut self, data: &[u8]) {
        let hash = keccak256(data);
        for offset in [0usize, 2, 4] {
            let pair = u16::from_be_bytes([hash.0[offset], hash.0[offset + 1]]);
            let bit_index = (pair as usize) % 2048;
            let bit = 2047 - bit_index;
            self.0[BLOOM_BYTES - 1 - bit / 8] |= 1 << (bit % 8);
        }
    }

    pub fn accrue_log(&mut self, log: &Log) {
        self.accrue(log.address.0.as_slice());
        for topic in &log.topics {
            self.accrue(topic.0.as_slice());
        }
    }

    pub fn contains(&self, other: &Bloom) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a & b == *b)
    }

    pub fn merge(&mut self, other: &Bloom) {
        for (a, b) in self.0.iter_mut().zip(other.0.iter()) {
            *a |= b;
        }
    }
}

impl Encodable for Log {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        ListEncoder::new()
            .field(&self.address)
            .raw_field(&exec_rlp::encode::encode_list(&self.topics))
            .field(&self.data)
            .finish(out);
    }
}

impl Decodable for Log {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let mut list = rlp.list()?;
        let address = Address::rlp_decode(&mut list)?;
        let topics = Vec::rlp_decode(&mut list)?;
        let data = Vec::rlp_decode(&mut list)?;
        Ok(Log { address, topics, data })
    }
}

impl Encodable for Bloom {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        exec_rlp::encode::encode_bytes(&self.0, out);
    }
}

impl Decodable for Bloom {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let bytes = rlp.bytes()?;
        if bytes.len() != BLOOM_BYTES {
            return Err(RlpError::ArrayLengthUnexpected { expected: BLOOM_BYTES, found: bytes.len() });
        }
        let mut buf = [0u8; BLOOM_BYTES];
        buf.copy_from_slice(bytes);
        Ok(Bloom(buf))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_type: TxType,
    pub status: bool,
    pub cumulative_gas_used: u64,
    pub bloom: Bloom,
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn from_logs(tx_type: TxType, status: bool, cumulative_gas_used: u64, logs: Vec<Log>) -> Self {
        let mut bloom = Bloom::empty();
        for log in &logs {
            bloom.accrue_log(log);
        }
        Receipt { tx_type, status, cumulative_gas_used, bloom, logs }
    }

    fn body_list(&self) -> ListEncoder {
        ListEncoder::new()
            .field(&self.status)
            .field(&self.cumulative_gas_used)
            .field(&self.bloom)
            .raw_field(&exec_rlp::encode::encode_list(&self.logs))
    }
}

impl Encodable for Receipt {
    /// Frames this receipt as one item of the receipts trie's value set:
    /// legacy is a bare list, typed receipts wrap `type_byte || rlp(body)`
    /// in an RLP string header.
    fn rlp_append(&self, out: &mut Vec<u8>) {
        match self.tx_type {
            TxType::Legacy => self.body_list().finish(out),
            _ => {
                let mut raw = vec![self.tx_type as u8];
                self.body_list().finish(&mut raw);
                exec_rlp::encode::encode_bytes(&raw, out);
            }
        }
    }
}

impl Decodable for Receipt {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let peek = *rlp.remaining().first().ok_or(RlpError::InputTooShort)?;
        let (tx_type, mut body) = if peek >= 0xc0 {
            (TxType::Legacy, rlp.list()?)
        } else {
            let raw = rlp.bytes()?;
            let tx_type = TxType::from_byte(*raw.first().ok_or(RlpError::InputTooShort)?)?;
            let mut inner = Rlp::new(&raw[1..]);
            (tx_type, inner.list()?)
        };
        let status: bool = Decodable::rlp_decode(&mut body)?;
        let cumulative_gas_used = body.u64()?;
        let bloom = Bloom::rlp_decode(&mut body)?;
        let logs = Vec::rlp_decode(&mut body)?;
        Ok(Receipt { tx_type, status, cumulative_gas_used, bloom, logs })
    }
}
