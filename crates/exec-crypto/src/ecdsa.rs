//! secp256k1 signature recovery (`ecrecover`), covering the three `v`
//! encodings a transaction can carry: pre-EIP-155 legacy (27/28),
//! EIP-155 (`35 + chain_id*2` or `36 + chain_id*2`), and typed-transaction
//! parity bits (0/1, EIP-2930 onward).

use crate::error::{CryptoError, CryptoResult};
use crate::hashing::keccak256;
use exec_primitives::{Address, Hash256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use subtle::{Choice, ConstantTimeEq};

/// secp256k1 curve order, n.
const SECP256K1_ORDER: [u8; 32] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
];

/// n/2, the EIP-2 malleability threshold.
const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Interpret a transaction's `v` field, deriving the curve recovery id and,
/// for EIP-155 legacy transactions, the chain id it was signed against.
pub fn parse_recovery_id(v: u64) -> CryptoResult<(RecoveryId, Option<u64>)> {
    let (parity, chain_id) = match v {
        0 | 1 => (v as u8, None),
        27 | 28 => ((v - 27) as u8, None),
        v if v >= 35 => {
            let chain_id = (v - 35) / 2;
            let parity = ((v - 35) % 2) as u8;
            (parity, Some(chain_id))
        }
        _ => return Err(CryptoError::InvalidRecoveryId(v)),
    };
    let recovery_id =
        RecoveryId::try_from(parity).map_err(|_| CryptoError::InvalidRecoveryId(v))?;
    Ok((recovery_id, chain_id))
}

/// EIP-155 `v` for a given chain id and curve parity bit.
pub fn eip155_v(chain_id: u64, parity: u8) -> u64 {
    35 + chain_id * 2 + parity as u64
}

fn is_valid_scalar(scalar: &[u8; 32]) -> bool {
    let mut is_zero = Choice::from(1u8);
    for &byte in scalar {
        is_zero &= byte.ct_eq(&0u8);
    }
    let (less, _) = compare_constant_time(scalar, &SECP256K1_ORDER);
    (!is_zero & less).into()
}

/// Strict `s < n/2`, constant-time, per EIP-2's non-malleability rule.
fn is_low_s(s: &[u8; 32]) -> bool {
    let (less, _) = compare_constant_time(s, &SECP256K1_HALF_ORDER);
    less.into()
}

fn compare_constant_time(a: &[u8; 32], b: &[u8; 32]) -> (Choice, Choice) {
    let mut less = Choice::from(0u8);
    let mut greater = Choice::from(0u8);
    for i in 0..32 {
        let not_decided = !(less | greater);
        let byte_less = Choice::from((a[i] < b[i]) as u8);
        let byte_greater = Choice::from((a[i] > b[i]) as u8);
        less |= not_decided & byte_less;
        greater |= not_decided & byte_greater;
    }
    (less, greater)
}

/// Recover the signer address from a prehashed message and an (r, s, v)
/// signature. Enforces EIP-2 low-s and in-range r/s; callers that need the
/// signed chain id back (to cross-check against a typed transaction's own
/// `chain_id` field) get it as the second tuple element.
pub fn recover_signer(
    message_hash: &Hash256,
    r: &[u8; 32],
    s: &[u8; 32],
    v: u64,
) -> CryptoResult<(Address, Option<u64>)> {
    if !is_valid_scalar(r) || !is_valid_scalar(s) {
        return Err(CryptoError::ScalarOutOfRange);
    }
    if !is_low_s(s) {
        return Err(CryptoError::MalleableSignature);
    }

    let (recovery_id, chain_id) = parse_recovery_id(v)?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(r);
    sig_bytes[32..].copy_from_slice(s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| CryptoError::RecoveryFailed)?;

    let recovered_key =
        VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &sig, recovery_id)
            .map_err(|_| CryptoError::RecoveryFailed)?;

    let encoded = recovered_key.to_encoded_point(false);
    let pubkey_bytes = encoded.as_bytes();
    let hash = keccak256(&pubkey_bytes[1..]);
    Ok((Address::from_word_tail(hash.as_bytes().try_into().unwrap()), chain_id))
}
