//! `CREATE`/`CREATE2` address derivation (Yellow Paper §7, EIP-1014).

use exec_crypto::keccak256;
use exec_primitives::{Address, Hash256};
use exec_rlp::encode::{Encodable, ListEncoder};

/// `CREATE`: `keccak256(rlp([sender, nonce]))[12..]`.
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let mut encoded = Vec::new();
    ListEncoder::new()
        .field(sender)
        .field(&nonce)
        .finish(&mut encoded);
    let hash = keccak256(&encoded);
    Address::from_word_tail(hash.as_bytes().try_into().unwrap())
}

/// `CREATE2`: `keccak256(0xff || sender || salt || keccak256(init_code))[12..]`.
pub fn create2_address(sender: &Address, salt: &Hash256, init_code: &[u8]) -> Address {
    let init_code_hash = keccak256(init_code);
    let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
    preimage.push(0xff);
    preimage.extend_from_slice(sender.as_bytes());
    preimage.extend_from_slice(salt.as_bytes());
    preimage.extend_from_slice(init_code_hash.as_bytes());
    let hash = keccak256(&preimage);
    Address::from_word_tail(hash.as_bytes().try_into().unwrap())
}
