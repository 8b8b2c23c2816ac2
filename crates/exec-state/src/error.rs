use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("trie storage error: {0}")]
    Storage(#[from] exec_trie::storage::StorageError),

    #[error("account codec error: {0}")]
    Codec(exec_rlp::RlpError),

    #[error("transaction conflicts with an already-merged write to {address:?}")]
    MergeConflict { address: exec_primitives::Address },

    #[error("sender {address:?} nonce mismatch: expected {expected}, got {found}")]
    NonceMismatch {
        address: exec_primitives::Address,
        expected: u64,
        found: u64,
    },

    #[error("sender {address:?} balance {balance:?} insufficient for {required:?}")]
    InsufficientBalance {
        address: exec_primitives::Address,
        balance: exec_primitives::U256,
        required: exec_primitives::U256,
    },
}

pub type StateResult<T> = Result<T, StateError>;
