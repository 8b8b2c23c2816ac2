use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("recovery id byte {0} is not one of 0, 1, 27, 28, or a valid EIP-155 v")]
    InvalidRecoveryId(u64),

    #[error("signature r or s is zero or not less than the secp256k1 curve order")]
    ScalarOutOfRange,

    #[error("signature s is not in the lower half of the curve order (EIP-2)")]
    MalleableSignature,

    #[error("public key recovery failed for the given signature and message hash")]
    RecoveryFailed,
}

pub type CryptoResult<T> = Result<T, CryptoError>;
