//! Universal property 6: for a validly signed transaction, recovering the
//! sender returns the address that actually produced the signature.

use exec_executor::{Transaction, TxType};
use exec_primitives::{Address, U256};
use k256::ecdsa::{signature::Signer, RecoveryId, Signature, SigningKey, VerifyingKey};

fn address_of(key: &SigningKey) -> Address {
    let verifying = VerifyingKey::from(key);
    let encoded = verifying.to_encoded_point(false);
    let hash = exec_crypto::keccak256(&encoded.as_bytes()[1..]);
    Address::from_word_tail(hash.as_bytes().try_into().unwrap())
}

fn unsigned_transfer(nonce: u64, to: Address, value: u64) -> Transaction {
    Transaction {
        tx_type: TxType::Legacy,
        chain_id: None,
        nonce,
        gas_price: Some(U256::from_u64(1)),
        max_priority_fee_per_gas: None,
        max_fee_per_gas: None,
        gas_limit: 21_000,
        to: Some(to),
        value: U256::from_u64(value),
        data: Vec::new(),
        access_list: Vec::new(),
        max_fee_per_blob_gas: None,
        blob_versioned_hashes: Vec::new(),
        authorization_list: Vec::new(),
        v: 0,
        r: U256::ZERO,
        s: U256::ZERO,
    }
}

fn sign(key: &SigningKey, tx: &mut Transaction) {
    let hash = tx.signing_hash();
    let (signature, recid): (Signature, RecoveryId) = key.sign_prehash_recoverable(hash.as_bytes()).unwrap();
    let bytes = signature.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    tx.r = U256::from_big_endian(&r);
    tx.s = U256::from_big_endian(&s);
    tx.v = 27 + recid.to_byte() as u64;
}

#[test]
fn recovered_sender_matches_the_signing_key() {
    let key = SigningKey::from_bytes(&[0x11u8; 32].into()).unwrap();
    let sender = address_of(&key);
    let mut tx = unsigned_transfer(0, Address([0x99; 20]), 1);
    sign(&key, &mut tx);

    assert_eq!(tx.recover_sender().unwrap(), sender);
}

#[test]
fn recovered_sender_changes_if_the_transaction_body_is_tampered_with() {
    let key = SigningKey::from_bytes(&[0x22u8; 32].into()).unwrap();
    let mut tx = unsigned_transfer(3, Address([0x77; 20]), 5);
    sign(&key, &mut tx);
    let original = tx.recover_sender().unwrap();

    tx.value = U256::from_u64(6);
    let tampered = tx.recover_sender().unwrap();
    assert_ne!(original, tampered);
}
