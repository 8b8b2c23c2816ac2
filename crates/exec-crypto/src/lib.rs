//! # Execution Crypto
//!
//! Hashing and signature recovery shared across the trie, the executor, and
//! the chain spec: Keccak-256 (canonical hash), BLAKE3 (storage checksums),
//! and secp256k1 `ecrecover` with EIP-2/EIP-155 validation.

pub mod ecdsa;
pub mod error;
pub mod hashing;

pub use ecdsa::{eip155_v, parse_recovery_id, recover_signer};
pub use error::{CryptoError, CryptoResult};
pub use hashing::{blake3_hash, keccak256};
