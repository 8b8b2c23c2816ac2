//! # RLP Wire Codec
//!
//! Canonical Recursive Length Prefix encoding and decoding, shared by the
//! trie (node serialization, proof encoding), the executor (transaction and
//! receipt bodies), and the chain spec (block header hashing).
//!
//! Decoding rejects every non-canonical form the Yellow Paper's grammar
//! forbids — leading zeros in length prefixes, long-form lengths that would
//! have fit in short form, and single bytes wrapped in a one-byte string
//! header — because two different byte strings decoding to the same value
//! would make block hashes and signatures ambiguous.

pub mod decode;
pub mod encode;
pub mod error;
pub mod header;

pub use decode::{Decodable, Rlp};
pub use encode::{Encodable, ListEncoder};
pub use error::{RlpError, RlpResult};
pub use header::Header;
