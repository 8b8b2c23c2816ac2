//! # Execution Executor
//!
//! Transaction and block types, their RLP framing, and the block
//! executor that runs a block against committed state and validates the
//! result against the header's claims.

pub mod block;
pub mod context;
pub mod error;
pub mod executor;
pub mod gas;
pub mod receipt;
pub mod roots;
pub mod transaction;
pub mod withdrawal;

pub use block::Block;
pub use context::TxContext;
pub use error::{BlockError, BlockResult, TransactionError, TxResult};
pub use executor::{execute_block, ExecutionOutcome, MAX_INITCODE_SIZE};
pub use receipt::{Bloom, Receipt, BLOOM_BYTES};
pub use transaction::{AccessListItem, AuthorizationTuple, Transaction, TxType};
pub use withdrawal::Withdrawal;
