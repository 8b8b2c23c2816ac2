//! # Execution State
//!
//! Layered state views over the trie-backed storage engine: committed
//! per-block state (`BlockState`), speculative per-transaction overlays
//! (`TransactionState`) with access-set tracking, and the conflict
//! detection that decides which overlays can merge without re-execution.

pub mod access_set;
pub mod account;
pub mod block_state;
pub mod error;
pub mod transaction_state;

pub use access_set::{detect_conflicts, AccessSet, Conflict, ConflictKind};
pub use account::Account;
pub use block_state::BlockState;
pub use error::{StateError, StateResult};
pub use transaction_state::{Overlay, TransactionState};
