//! Utility helpers for page size, alignment, and range calculations.

use crate::errors::{MmapEngineError, Result};

/// Get the system page size in bytes.
#[must_use]
pub fn page_size() -> usize {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            unix_page_size()
        } else {
            4096
        }
    }
}

#[cfg(unix)]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unix_page_size() -> usize {
    // SAFETY: sysconf with _SC_PAGESIZE is safe to call.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        4096
    } else {
        page_size as usize
    }
}

/// Align a value down to the nearest multiple of `alignment`.
#[must_use]
pub fn align_down(value: usize, alignment: usize) -> usize {
    if alignment == 0 {
        return value;
    }
    if alignment.is_power_of_two() {
        value & !(alignment - 1)
    } else {
        value - value % alignment
    }
}

/// Ensure the requested [offset, offset+len) range is within [0, extent).
///
/// # Errors
///
/// Returns `MmapEngineError::OutOfRange` if the range exceeds the extent.
pub fn ensure_in_extent(offset: u64, len: u64, extent: u64) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= extent => Ok(()),
        _ => Err(MmapEngineError::OutOfRange { offset, len, extent }),
    }
}

/// Convert a byte count to `usize`, failing with `OutOfRange` if it does not
/// fit in the address space.
///
/// # Errors
///
/// Returns `MmapEngineError::OutOfRange` on overflow.
pub fn to_usize(offset: u64, len: u64) -> Result<usize> {
    usize::try_from(len).map_err(|_| MmapEngineError::OutOfRange {
        offset,
        len,
        extent: usize::MAX as u64,
    })
}
