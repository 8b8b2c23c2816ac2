//! # Execution Trie
//!
//! Authenticated state storage: a persistent, versioned Modified Merkle
//! Patricia Trie backed by an append-only chunked node log instead of an
//! in-memory `HashMap`. Every written node stays reachable from its
//! version's root indefinitely until compaction reclaims chunks whose
//! records have aged out of [`storage::VersionIndex`]'s retention window.

pub mod engine;
pub mod nibbles;
pub mod node;
pub mod proof;
pub mod storage;

pub use engine::TrieEngine;
pub use nibbles::Nibbles;
pub use node::Node;
pub use proof::{verify_proof, Proof};
