//! S1 and universal property 1: `decode(encode(x)) == x` for the domain
//! entities the wire codec carries.

use exec_chainspec::Header as ChainHeader;
use exec_crypto::keccak256;
use exec_executor::{Receipt, TxType};
use exec_primitives::{Address, Hash256, U256};
use exec_rlp::decode::Decodable;
use exec_rlp::encode::Encodable;
use proptest::prelude::*;

/// S1: the three-byte string `"dog"` RLP-encodes to `0x83646f67`, and that
/// exact byte string decodes back to `"dog"`.
#[test]
fn s1_three_byte_string_round_trips_exactly() {
    let dog = b"dog".to_vec();
    let encoded = dog.rlp_encode();
    assert_eq!(encoded, vec![0x83, 0x64, 0x6f, 0x67]);

    let decoded: Vec<u8> = Vec::rlp_decode_complete(&[0x83, 0x64, 0x6f, 0x67]).unwrap();
    assert_eq!(decoded, dog);
}

fn sample_header() -> ChainHeader {
    ChainHeader {
        parent_hash: Hash256([1u8; 32]),
        ommers_hash: Hash256([2u8; 32]),
        coinbase: Address([3u8; 20]),
        state_root: Hash256([4u8; 32]),
        transactions_root: Hash256([5u8; 32]),
        receipts_root: Hash256([6u8; 32]),
        logs_bloom: [0u8; 256],
        difficulty: U256::from_u64(17),
        number: 9_000_000,
        gas_limit: 30_000_000,
        gas_used: 21_000,
        timestamp: 1_700_000_000,
        extra_data: vec![0xde, 0xad],
        mix_hash: Hash256([7u8; 32]),
        nonce: [0u8; 8],
        base_fee_per_gas: Some(U256::from_u64(1_000_000_000)),
        withdrawals_root: Some(Hash256([8u8; 32])),
    }
}

#[test]
fn header_round_trips_through_rlp() {
    let header = sample_header();
    let encoded = header.rlp_encode();
    let decoded = ChainHeader::rlp_decode_complete(&encoded).unwrap();
    assert_eq!(decoded, header);
}

#[test]
fn receipt_round_trips_through_rlp() {
    let receipt = Receipt::from_logs(TxType::Legacy, true, 21_000, Vec::new());
    let encoded = receipt.rlp_encode();
    let decoded = Receipt::rlp_decode_complete(&encoded).unwrap();
    assert_eq!(decoded, receipt);
}

/// `parent_hash`-chaining sanity check: a header's own hash depends on its
/// full contents, not just a subset of fields.
#[test]
fn header_hash_is_sensitive_to_every_field() {
    let a = sample_header();
    let mut b = a.clone();
    b.extra_data = vec![0xbe, 0xef];
    assert_ne!(a.hash(), b.hash());
    assert_eq!(a.hash(), keccak256(&a.rlp_encode()));
}

proptest! {
    /// Property 1: any byte string round-trips through RLP encode/decode.
    #[test]
    fn arbitrary_byte_string_round_trips_through_rlp(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let encoded = bytes.rlp_encode();
        let decoded: Vec<u8> = Vec::rlp_decode_complete(&encoded).unwrap();
        prop_assert_eq!(decoded, bytes);
    }

    /// `U256` survives a big-endian byte round trip regardless of magnitude.
    #[test]
    fn arbitrary_u256_survives_big_endian_round_trip(limbs in [any::<u64>(); 4]) {
        let mut bytes = [0u8; 32];
        for (i, limb) in limbs.iter().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
        }
        let value = U256::from_big_endian(&bytes);
        prop_assert_eq!(value.to_big_endian(), bytes);
    }
}
