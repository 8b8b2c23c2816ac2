//! # Execution Primitives
//!
//! Fixed-width byte types and big-integer arithmetic shared by every other
//! crate in the execution core: 20-byte addresses, 32-byte hashes, and the
//! 128/256/512-bit unsigned integers the RLP codec, the trie, and the EVM
//! host shim all operate on.
//!
//! ## Layout
//!
//! - `address` / `hash` — fixed-size byte newtypes.
//! - `uint` — `U256`/`U512` wrappers over `primitive-types`, plus the
//!   EVM-specific operations (`SIGNEXTEND`, arithmetic shift, modular
//!   exponentiation) that a plain big-integer crate doesn't provide.

pub mod address;
pub mod hash;
pub mod uint;

pub use address::Address;
pub use hash::Hash256;
pub use uint::{U256, U512};

/// Keccak-256 of the empty byte string — the `code_hash` of an account with
/// no code and the `storage_root`/`EMPTY_TRIE_ROOT`'s *input*, not to be
/// confused with `EMPTY_TRIE_ROOT` itself (that hashes the RLP encoding of
/// the empty string, one further step removed).
pub const NULL_HASH: Hash256 = Hash256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Keccak-256 of `rlp("")` (the single byte `0x80`) — the root of an empty
/// Merkle Patricia Trie and the default `storage_root` of an account with no
/// storage. Distinct from [`NULL_HASH`], which hashes the empty string
/// itself rather than its RLP encoding.
pub const EMPTY_TRIE_ROOT: Hash256 = Hash256([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);
