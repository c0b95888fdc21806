//! Storage error taxonomy.
//!
//! `PageNotFound` never escapes `BufferPool::fetch_page` (a miss becomes a blank
//! page there); everything else is surfaced to the caller as-is.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("page not found (segment={segment_id}, page={page_number})")]
    PageNotFound { segment_id: u32, page_number: u32 },

    #[error("corrupt encoding: {0}")]
    CorruptEncoding(String),

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("buffer pool exhausted: all {capacity} frame(s) are pinned")]
    BufferPoolExhausted { capacity: usize },

    #[error("allocation mismatch in segment {segment_id}: expected page {expected}, got {actual}")]
    AllocationMismatch {
        segment_id: u32,
        expected: u32,
        actual: u32,
    },

    #[error("page {segment_id}:{page_number} failed to load: {reason}")]
    LoadFailed {
        segment_id: u32,
        page_number: u32,
        reason: String,
    },

    #[error("value too large to encode: {0}")]
    ValueTooLarge(String),

    #[error("record of {len} bytes exceeds page capacity ({max} bytes)")]
    RecordTooLarge { len: usize, max: usize },

    #[error("empty record: a zero length prefix terminates a page's records")]
    EmptyRecord,

    #[error("invalid page size: expected {expected} bytes, got {actual} bytes")]
    InvalidPageSize { expected: usize, actual: usize },

    #[error("I/O error on segment {segment_id} ({}): {source}", path.display())]
    Io {
        segment_id: u32,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    DirIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub(crate) fn io(segment_id: u32, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            segment_id,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        StorageError::CorruptEncoding(msg.into())
    }

    #[inline]
    pub fn is_page_not_found(&self) -> bool {
        matches!(self, StorageError::PageNotFound { .. })
    }
}
