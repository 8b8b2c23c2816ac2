use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("chunk log I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk {0} checksum mismatch — node bytes corrupted on disk")]
    ChecksumMismatch(u32),

    #[error("node pointer {0:?} does not resolve to a live record")]
    DanglingPointer(crate::storage::pointer::NodePointer),

    #[error("node codec error: {0}")]
    Codec(#[from] exec_rlp::RlpError),

    #[error("version {0} has been compacted away and is no longer retrievable")]
    VersionEvicted(u64),

    #[error("I/O ring failure: {0}")]
    Ring(#[from] exec_io::IoRingError),
}

pub type StorageResult<T> = Result<T, StorageError>;
