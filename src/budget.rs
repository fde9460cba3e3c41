//! Global mapping budget, split evenly across the files of a workload.

use log::warn;

use crate::errors::{MmapEngineError, Result};

/// Total bytes that may be mapped at once across all files (1 GiB).
pub const DEFAULT_TOTAL_BUDGET: u64 = 1024 * 1024 * 1024;

/// Per-file window sizing derived once at engine start.
///
/// Immutable after construction. Engines share it through an `Arc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBudget {
    total: u64,
    file_count: usize,
    window_size: u64,
    window_size_pow2: u64,
}

impl MapBudget {
    /// Divide `total` bytes evenly across `file_count` files.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::NoFiles` if `file_count` is zero.
    pub fn new(total: u64, file_count: usize) -> Result<Self> {
        if file_count == 0 {
            return Err(MmapEngineError::NoFiles);
        }
        let window_size = total / file_count as u64;
        if window_size == 0 {
            warn!("mmap budget of {total} bytes leaves no window for {file_count} files");
        }
        Ok(Self {
            total,
            file_count,
            window_size,
            window_size_pow2: pow2_floor(window_size),
        })
    }

    /// Total budget in bytes.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of files the budget was divided across.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Target window size per file.
    #[must_use]
    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Largest power of two not above `window_size` (1 when the window is empty).
    /// Not consumed by the window manager.
    #[must_use]
    pub fn window_size_pow2(&self) -> u64 {
        self.window_size_pow2
    }
}

fn pow2_floor(value: u64) -> u64 {
    let mut mask = value;
    let mut shift = 0;
    loop {
        mask >>= 1;
        if mask == 0 {
            break;
        }
        shift += 1;
    }
    1 << shift
}
