//! Account record: the Yellow Paper's four-field `(nonce, balance,
//! storageRoot, codeHash)` tuple, RLP-encoded as the trie leaf value.

use exec_primitives::{EMPTY_TRIE_ROOT, Hash256, NULL_HASH, U256};
use exec_rlp::decode::{Decodable, Rlp};
use exec_rlp::encode::{Encodable, ListEncoder};
use exec_rlp::RlpResult;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub nonce: u64,
    pub balance: U256,
    pub storage_root: Hash256,
    pub code_hash: Hash256,
}

impl Account {
    pub fn empty() -> Self {
        Account {
            nonce: 0,
            balance: U256::ZERO,
            storage_root: EMPTY_TRIE_ROOT,
            code_hash: NULL_HASH,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && self.code_hash == NULL_HASH
    }
}

impl Default for Account {
    fn default() -> Self {
        Self::empty()
    }
}

impl Encodable for Account {
    fn rlp_append(&self, out: &mut Vec<u8>) {
        ListEncoder::new()
            .field(&self.nonce)
            .field(&self.balance)
            .field(&self.storage_root)
            .field(&self.code_hash)
            .finish(out);
    }
}

impl Decodable for Account {
    fn rlp_decode(rlp: &mut Rlp<'_>) -> RlpResult<Self> {
        let mut list = rlp.list()?;
        Ok(Account {
            nonce: list.u64()?,
            balance: list.u256()?,
            storage_root: list.hash256()?,
            code_hash: list.hash256()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_account_round_trips() {
        let acct = Account::empty();
        let encoded = acct.rlp_encode();
        let decoded = Account::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, acct);
    }

    #[test]
    fn populated_account_round_trips() {
        let acct = Account {
            nonce: 7,
            balance: U256::from_u64(1_000_000),
            storage_root: Hash256([0x11; 32]),
            code_hash: Hash256([0x22; 32]),
        };
        let encoded = acct.rlp_encode();
        let decoded = Account::rlp_decode_complete(&encoded).unwrap();
        assert_eq!(decoded, acct);
    }
}
