use thiserror::Error;

/// Failures the RLP codec can surface while decoding untrusted bytes.
///
/// Every variant corresponds to a rejection the Yellow Paper's RLP grammar
/// makes mandatory; a decoder that accepts any of these inputs admits
/// non-canonical encodings and breaks hash/signature determinism.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RlpError {
    #[error("expected a {expected}, found {found}")]
    TypeUnexpected {
        expected: &'static str,
        found: &'static str,
    },

    #[error("input ended before the declared payload length")]
    InputTooShort,

    #[error("trailing bytes after the decoded item")]
    InputTooLong,

    #[error("declared length overflows usize")]
    Overflow,

    #[error("length prefix has a leading zero byte")]
    LeadingZero,

    #[error("expected a list of {expected} items, found {found}")]
    ArrayLengthUnexpected { expected: usize, found: usize },

    #[error("single byte below 0x80 must be encoded as itself, not length-prefixed")]
    NonCanonicalSingleByte,

    #[error("short-form length used where long-form was required, or vice versa")]
    NonCanonicalLength,

    #[error("invalid typed-transaction envelope byte: {0:#04x}")]
    InvalidTxnType(u8),
}

pub type RlpResult<T> = Result<T, RlpError>;
