//! Crate-specific error types for mmap-engine.

use std::io;
use thiserror::Error;

/// Result alias for mmap-engine operations.
pub type Result<T> = std::result::Result<T, MmapEngineError>;

/// Error type covering request validation, mapping, and flush failures.
#[derive(Debug, Error)]
pub enum MmapEngineError {
    /// Wrapper for `std::io::Error` raised by file lifecycle calls.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A single request is larger than one window can hold.
    #[error("request too large for mmap window: len={len}, window_size={window_size}")]
    RequestTooLarge {
        /// Requested length.
        len: u64,
        /// Per-file window capacity.
        window_size: u64,
    },

    /// A request or extent reaches past the bytes this engine may touch.
    #[error("range out of bounds: offset={offset}, len={len}, extent={extent}")]
    OutOfRange {
        /// Requested offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Size of the extent the range was checked against.
        extent: u64,
    },

    /// Establishing a mapping failed.
    #[error("mmap failed: {0}")]
    MapFailed(#[source] io::Error),

    /// Releasing a mapping failed.
    #[error("munmap failed: {0}")]
    UnmapFailed(#[source] io::Error),

    /// An access-pattern or cache-drop hint was refused by the OS.
    #[error("madvise failed: {0}")]
    AdviceFailed(#[source] io::Error),

    /// Writing mapped pages back to storage failed.
    #[error("msync failed: {0}")]
    FlushFailed(#[source] io::Error),

    /// Operation not permitted by the request's protection mode.
    #[error("invalid access mode: {0}")]
    InvalidMode(&'static str),

    /// Execute was called on a read/write request that has no resolved view.
    #[error("request has not been prepared")]
    NotPrepared,

    /// The request's view refers to a window that has since been replaced.
    #[error("request view refers to a replaced window")]
    StaleView,

    /// The budget cannot be divided across zero files.
    #[error("mapping budget requires at least one file")]
    NoFiles,
}

impl MmapEngineError {
    /// Underlying OS error code, when the failure came from the OS.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Io(e)
            | Self::MapFailed(e)
            | Self::UnmapFailed(e)
            | Self::AdviceFailed(e)
            | Self::FlushFailed(e) => e.raw_os_error(),
            _ => None,
        }
    }
}
