//! The five transaction envelopes mainnet has shipped, RLP-framed exactly
//! as consensus requires: bare RLP inside a block's transaction list for
//! legacy, `type_byte || rlp(payload)` for every typed envelope.

use exec_crypto::{eip155_v, keccak256, parse_recovery_id, recover_signer, CryptoError};
use exec_primitives::{Address, Hash256, U256};
use exec_rlp::decode::{Decodable, Rlp};
use exec_rlp::encode::{Encodable, ListEncoder};
use exec_rlp::{RlpError, RlpResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxType {
    Legacy = 0,
    Eip2930 = 1,
    Eip1559 = 2,
    Eip4844 = 3,
    Eip7702 = 4,
}

impl TxType {
    pub fn from_byte(b: u8) -> RlpResult<Self> {
        match b {
            0 => Ok(TxType::Legacy),
            1 => Ok(TxType::Eip2930),
            2 => Ok(TxType::Eip1559),
            3 => Ok(TxType::Eip4844),
            4 => Ok(TxType::Eip7702),
            other => Err(RlpError::InvalidTxnType(other)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<Hash256>,
}

impl Encodable for AccessListItem {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        ListEncoder::new()
            .field(&self.address)
            .raw_field(&exec_rlp::encode::encode_list(&self.storage_keys))
            .finish(out);
    }
}

impl Decodable for AccessListItem {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let mut list = rlp.list()?;
        Ok(AccessListItem {
            address: list.address()?,
            storage_keys: Vec::rlp_decode(&mut list)?,
        })
    }
}

/// EIP-7702: one "set my code to this contract's" authorization. Carried
/// verbatim through RLP; `exec-executor` doesn't itself apply delegation
/// semantics (that's an EVM-interpreter concern, see `host.rs`'s doc note).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationTuple {
    pub chain_id: u64,
    pub address: Address,
    pub nonce: u64,
    pub y_parity: u8,
    pub r: U256,
    pub s: U256,
}

impl Encodable for AuthorizationTuple {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        ListEncoder::new()
            .field(&self.chain_id)
            .field(&self.address)
            .field(&self.nonce)
            .field(&self.y_parity)
            .field(&self.r)
            .field(&self.s)
            .finish(out);
    }
}

impl Decodable for AuthorizationTuple {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let mut list = rlp.list()?;
        Ok(AuthorizationTuple {
            chain_id: list.u64()?,
            address: list.address()?,
            nonce: list.u64()?,
            y_parity: list.u8()?,
            r: list.u256()?,
            s: list.u256()?,
        })
    }
}

fn decode_to(rlp: &mut Rlp<'_>) -> RlpResult<Option<Address>> {
    let bytes = rlp.bytes()?;
    if bytes.is_empty() {
        Ok(None)
    } else {
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| RlpError::ArrayLengthUnexpected { expected: 20, found: bytes.len() })?;
        Ok(Some(Address(arr)))
    }
}

fn append_to(to: &Option<Address>, out: &mut Vec<u8>) {
    match to {
        Some(addr) => addr.rlp_append(out),
        None => exec_rlp::encode::encode_bytes(&[], out),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub tx_type: TxType,
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_price: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub gas_limit: u64,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: Vec<AccessListItem>,
    pub max_fee_per_blob_gas: Option<U256>,
    pub blob_versioned_hashes: Vec<Hash256>,
    pub authorization_list: Vec<AuthorizationTuple>,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl Transaction {
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }

    /// Maximum fee the sender could owe: `gas_limit * max_fee + value` (plus
    /// blob gas for type-3). Used for the upfront-balance check.
    pub fn upfront_cost(&self) -> U256 {
        let gas_fee = self.max_fee_per_gas.or(self.gas_price).unwrap_or(U256::ZERO);
        let gas_cost = gas_fee.saturating_add(U256::ZERO) * U256::from_u64(self.gas_limit);
        gas_cost.saturating_add(self.value)
    }

    /// EIP-1559 effective gas price: `min(max_fee, base_fee + priority_fee)`,
    /// or the flat `gas_price` for legacy/2930.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        match (self.max_fee_per_gas, self.max_priority_fee_per_gas, base_fee) {
            (Some(max_fee), Some(priority_fee), Some(base)) => {
                let priority = priority_fee.saturating_add(base).saturating_sub(base).min(priority_fee);
                let capped = base.saturating_add(priority).min(max_fee);
                capped.max(base)
            }
            _ => self.gas_price.unwrap_or(U256::ZERO),
        }
    }

    fn signing_fields(&self) -> ListEncoder {
        match self.tx_type {
            TxType::Legacy => ListEncoder::new()
                .field(&self.nonce)
                .field(&self.gas_price.unwrap_or(U256::ZERO))
                .field(&self.gas_limit)
                .raw_field(&{
                    let mut b = Vec::new();
                    append_to(&self.to, &mut b);
                    b
                })
                .field(&self.value)
                .field(&self.data),
            TxType::Eip2930 => ListEncoder::new()
                .field(&self.chain_id.unwrap_or_default())
                .field(&self.nonce)
                .field(&self.gas_price.unwrap_or(U256::ZERO))
                .field(&self.gas_limit)
                .raw_field(&{
                    let mut b = Vec::new();
                    append_to(&self.to, &mut b);
                    b
                })
                .field(&self.value)
                .field(&self.data)
                .raw_field(&exec_rlp::encode::encode_list(&self.access_list)),
            TxType::Eip1559 => ListEncoder::new()
                .field(&self.chain_id.unwrap_or_default())
                .field(&self.nonce)
                .field(&self.max_priority_fee_per_gas.unwrap_or(U256::ZERO))
                .field(&self.max_fee_per_gas.unwrap_or(U256::ZERO))
                .field(&self.gas_limit)
                .raw_field(&{
                    let mut b = Vec::new();
                    append_to(&self.to, &mut b);
                    b
                })
                .field(&self.value)
                .field(&self.data)
                .raw_field(&exec_rlp::encode::encode_list(&self.access_list)),
            TxType::Eip4844 => ListEncoder::new()
                .field(&self.chain_id.unwrap_or_default())
                .field(&self.nonce)
                .field(&self.max_priority_fee_per_gas.unwrap_or(U256::ZERO))
                .field(&self.max_fee_per_gas.unwrap_or(U256::ZERO))
                .field(&self.gas_limit)
                .field(&self.to.unwrap_or(Address::ZERO))
                .field(&self.value)
                .field(&self.data)
                .raw_field(&exec_rlp::encode::encode_list(&self.access_list))
                .field(&self.max_fee_per_blob_gas.unwrap_or(U256::ZERO))
                .raw_field(&exec_rlp::encode::encode_list(&self.blob_versioned_hashes)),
            TxType::Eip7702 => ListEncoder::new()
                .field(&self.chain_id.unwrap_or_default())
                .field(&self.nonce)
                .field(&self.max_priority_fee_per_gas.unwrap_or(U256::ZERO))
                .field(&self.max_fee_per_gas.unwrap_or(U256::ZERO))
                .field(&self.gas_limit)
                .raw_field(&{
                    let mut b = Vec::new();
                    append_to(&self.to, &mut b);
                    b
                })
                .field(&self.value)
                .field(&self.data)
                .raw_field(&exec_rlp::encode::encode_list(&self.access_list))
                .raw_field(&exec_rlp::encode::encode_list(&self.authorization_list)),
        }
    }

    /// The hash actually signed: legacy pre-155 signs the six bare fields,
    /// legacy EIP-155 appends `(chain_id, 0, 0)`, every typed envelope signs
    /// `keccak256(type_byte || rlp(unsigned fields))`.
    pub fn signing_hash(&self) -> Hash256 {
        let mut payload = Vec::new();
        match self.tx_type {
            TxType::Legacy => {
                let mut encoder = self.signing_fields();
                if let Some(chain_id) = self.chain_id {
                    encoder = encoder
                        .field(&chain_id)
                        .field(&0u64)
                        .field(&0u64);
                }
                encoder.finish(&mut payload);
            }
            _ => {
                payload.push(self.tx_type as u8);
                self.signing_fields().finish(&mut payload);
            }
        }
        keccak256(&payload)
    }

    pub fn recover_sender(&self) -> Result<Address, CryptoError> {
        let (recovery_id, _) = parse_recovery_id(self.v)?;
        let hash = self.signing_hash();
        let (address, _) =
            recover_signer(&hash, &self.r.to_big_endian(), &self.s.to_big_endian(), recovery_id_to_v(recovery_id))?;
        Ok(address)
    }

    /// `type_byte || rlp(fields_incl_signature)` for typed envelopes, or the
    /// bare signed list for legacy — the form a raw transaction is
    /// identified and hashed by (`keccak256(raw_bytes())`), independent of
    /// how the transaction is framed as an item inside a block's list.
    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self.tx_type {
            TxType::Legacy => self.legacy_signed_list().finish(&mut out),
            _ => {
                out.push(self.tx_type as u8);
                let mut encoder = self.signing_fields();
                encoder = encoder.field(&self.v).field(&self.r).field(&self.s);
                let mut payload = Vec::new();
                encoder.finish(&mut payload);
                out.extend_from_slice(&payload);
            }
        }
        out
    }

    pub fn hash(&self) -> Hash256 {
        keccak256(&self.raw_bytes())
    }

    fn legacy_signed_list(&self) -> ListEncoder {
        ListEncoder::new()
            .field(&self.nonce)
            .field(&self.gas_price.unwrap_or(U256::ZERO))
            .field(&self.gas_limit)
            .raw_field(&{
                let mut b = Vec::new();
                append_to(&self.to, &mut b);
                b
            })
            .field(&self.value)
            .field(&self.data)
            .field(&self.v)
            .field(&self.r)
            .field(&self.s)
    }
}

impl Encodable for Transaction {
    /// Frames this transaction as one item of a block's transaction list:
    /// legacy transactions are a bare RLP list, typed transactions are
    /// `type_byte || rlp(fields)` wrapped in an RLP string header (EIP-2718).
    fn rlp_append(&self, out: &mut Vec<u8>) {
        match self.tx_type {
            TxType::Legacy => self.legacy_signed_list().finish(out),
            _ => exec_rlp::encode::encode_bytes(&self.raw_bytes(), out),
        }
    }
}

impl Decodable for Transaction {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let peek = *rlp.remaining().first().ok_or(RlpError::InputTooShort)?;
        if peek >= 0xc0 {
            let mut list = rlp.list()?;
            let nonce = list.u64()?;
            let gas_price = Some(list.u256()?);
            let gas_limit = list.u64()?;
            let to = decode_to(&mut list)?;
            let value = list.u256()?;
            let data = Vec::rlp_decode(&mut list)?;
            let v = list.u64()?;
            let r = list.u256()?;
            let s = list.u256()?;
            let chain_id = eip155_chain_id(v);
            return Ok(Transaction {
                tx_type: TxType::Legacy,
                chain_id,
                nonce,
                gas_price,
                max_priority_fee_per_gas: None,
                max_fee_per_gas: None,
                gas_limit,
                to,
                value,
                data,
                access_list: Vec::new(),
                max_fee_per_blob_gas: None,
                blob_versioned_hashes: Vec::new(),
                authorization_list: Vec::new(),
                v,
                r,
                s,
            });
        }
        let raw = rlp.bytes()?;
        let tx_type_byte = *raw.first().ok_or(RlpError::InputTooShort)?;
        let tx_type = TxType::from_byte(tx_type_byte)?;
        let mut inner = Rlp::new(&raw[1..]);
        let mut list = inner.list()?;
        decode_typed_fields(tx_type, &mut list)
    }
}

fn eip155_chain_id(v: u64) -> Option<u64> {
    if v >= 35 {
        Some((v - 35) / 2)
    } else {
        None
    }
}

fn recovery_id_to_v(id: k256::ecdsa::RecoveryId) -> u64 {
    id.to_byte() as u64
}

fn decode_typed_fields(tx_type: TxType, list: &mut Rlp<'_>) -> RlpResult<Transaction> {
    let chain_id = Some(list.u64()?);
    let nonce = list.u64()?;
    let (gas_price, max_priority_fee_per_gas, max_fee_per_gas) = match tx_type {
        TxType::Eip2930 => (Some(list.u256()?), None, None),
        _ => {
            let priority = list.u256()?;
            let max_fee = list.u256()?;
            (None, Some(priority), Some(max_fee))
        }
    };
    let gas_limit = list.u64()?;
    let to = match tx_type {
        TxType::Eip4844 => Some(list.address()?),
        _ => decode_to(list)?,
    };
    let value = list.u256()?;
    let data = Vec::rlp_decode(list)?;
    let access_list = Vec::rlp_decode(list)?;
    let (max_fee_per_blob_gas, blob_versioned_hashes) = if tx_type == TxType::Eip4844 {
        (Some(list.u256()?), Vec::rlp_decode(list)?)
    } else {
        (None, Vec::new())
    };
    let authorization_list = if tx_type == TxType::Eip7702 {
        Vec::rlp_decode(list)?
    } else {
        Vec::new()
    };
    let v = list.u64()?;
    let r = list.u256()?;
    let s = list.u256()?;
    Ok(Transaction {
        tx_type,
        chain_id,
        nonce,
        gas_price,
        max_priority_fee_per_gas,
        max_fee_per_gas,
        gas_limit,
        to,
        value,
        data,
        access_list,
        max_fee_per_blob_gas,
        blob_versioned_hashes,
        authorization_list,
        v,
        r,
        s,
    })
}

impl PartialEq for TxType {
    fn eq(&self, other: &Self) -> bool {
        *self as u8 == *other as u8
    }
}
impl Eq for TxType {}

/// Transaction v-field signed into `eip155_v`, exposed for callers building
/// a `Transaction` by hand rather than decoding one.
pub fn pack_legacy_v(chain_id: Option<u64>, y_parity: u8) -> u64 {
    match chain_id {
        Some(id) => eip155_v(id, y_parity as u64),
        None => 27 + y_parity as u64,
    }
}
