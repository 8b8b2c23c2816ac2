//! # Execution EVM Host
//!
//! The narrow interface a bytecode interpreter calls into for state
//! reads/writes, plus the address-derivation and block-hash resolution
//! rules that interface depends on but that don't belong to state
//! storage itself.

pub mod block_hashes;
pub mod create;
pub mod host;
pub mod message;

pub use block_hashes::{BlockHashRing, BLOCKHASH_WINDOW};
pub use create::{create2_address, create_address};
pub use host::{apply_sender_prelude, AccessStatus, ExecHost, Host, Log};
pub use message::{Evm, ExecutionResult, ExecutionStatus, Message, MessageKind};
