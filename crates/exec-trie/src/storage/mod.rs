pub mod cache;
pub mod chunk_log;
pub mod compaction;
pub mod error;
pub mod pointer;
pub mod version_index;

pub use cache::NodeCache;
pub use chunk_log::ChunkLog;
pub use error::{StorageError, StorageResult};
pub use pointer::NodePointer;
pub use version_index::{VersionEntry, VersionIndex, SLOTS};
