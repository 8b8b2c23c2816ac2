use exec_primitives::{Address, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("sender {address:?} balance {balance:?} insufficient for upfront cost {required:?}")]
    InsufficientBalance { address: Address, balance: U256, required: U256 },

    #[error("intrinsic gas {intrinsic} exceeds the transaction's gas limit {limit}")]
    IntrinsicGasGreaterThanLimit { intrinsic: u64, limit: u64 },

    #[error("sender {address:?} nonce mismatch: account has {expected}, transaction has {found}")]
    BadNonce { address: Address, expected: u64, found: u64 },

    #[error("sender {address:?} has contract code; only EOAs may originate transactions")]
    SenderNotEOA { address: Address },

    #[error("transaction type {0} is not activated at this revision")]
    TypeNotSupported(u8),

    #[error("max fee per gas {max_fee:?} is below the block's base fee {base_fee:?}")]
    MaxFeeLessThanBase { max_fee: U256, base_fee: U256 },

    #[error("max priority fee per gas {priority:?} exceeds max fee per gas {max_fee:?}")]
    PriorityFeeGreaterThanMax { priority: U256, max_fee: U256 },

    #[error("sender {address:?} nonce {nonce} would exceed the u64 maximum")]
    NonceExceedsMax { address: Address, nonce: u64 },

    #[error("init code size {size} exceeds the EIP-3860 limit {limit}")]
    InitCodeLimitExceeded { size: usize, limit: usize },

    #[error("cumulative gas used would exceed the block gas limit")]
    GasLimitReached,

    #[error("transaction chain id {found:?} does not match the chain's {expected}")]
    WrongChainId { expected: u64, found: Option<u64> },

    #[error("transaction signature does not recover to a valid sender")]
    MissingSender,

    #[error("gas accounting overflowed a u64")]
    GasLimitOverflow,
}

#[derive(Debug, Error)]
pub enum BlockError {
    #[error("transaction processing failed: {0}")]
    Transaction(#[from] TransactionError),

    #[error("state error: {0}")]
    State(#[from] exec_state::StateError),

    #[error("trie error computing a root: {0}")]
    Trie(#[from] exec_trie::storage::StorageError),

    #[error("computed ommers hash does not match the header's")]
    WrongOmmersHash,

    #[error("computed state/receipts/transactions root does not match the header's")]
    WrongMerkleRoot,

    #[error("block gas used {used} exceeds the header's gas limit {limit}")]
    GasAboveLimit { used: u64, limit: u64 },

    #[error("block timestamp {found} does not exceed parent timestamp {parent}")]
    TimestampMismatch { parent: u64, found: u64 },

    #[error("block declares {declared} withdrawals but the spec's withdrawals feature is inactive")]
    UnexpectedWithdrawals { declared: usize },

    #[error("two transactions in this block both wrote to the same state with no serial fallback")]
    UnresolvedConflict,
}

pub type BlockResult<T> = Result<T, BlockError>;
pub type TxResult<T> = Result<T, TransactionError>;
