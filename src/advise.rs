//! Memory advise hints passed to the OS for mapped windows.

use std::io;

use crate::request::AccessPattern;
use crate::utils::{align_down, page_size};

/// Advice the engine gives the OS: an access-pattern hint for each new
/// window, or a cache drop for uncached requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmapAdvice {
    /// Random access pattern.
    Random,
    /// Sequential access pattern.
    Sequential,
    /// Drop cached pages for this range.
    DontNeed,
}

impl From<AccessPattern> for MmapAdvice {
    fn from(pattern: AccessPattern) -> Self {
        match pattern {
            AccessPattern::Sequential => MmapAdvice::Sequential,
            AccessPattern::Random => MmapAdvice::Random,
        }
    }
}

/// Apply `advice` to `len` bytes starting at `addr`.
///
/// The start is rounded down to a page boundary, as `madvise` requires.
/// On non-Unix targets this is a no-op.
///
/// # Safety
///
/// `addr..addr + len` must lie inside a live mapping owned by the caller.
pub(crate) unsafe fn advise_raw(addr: *const u8, len: usize, advice: MmapAdvice) -> io::Result<()> {
    if len == 0 {
        return Ok(());
    }
    let addr = addr as usize;
    let start = align_down(addr, page_size());
    let length = len + (addr - start);

    #[cfg(unix)]
    {
        use libc::{madvise, MADV_DONTNEED, MADV_RANDOM, MADV_SEQUENTIAL};

        let advice_flag = match advice {
            MmapAdvice::Random => MADV_RANDOM,
            MmapAdvice::Sequential => MADV_SEQUENTIAL,
            MmapAdvice::DontNeed => MADV_DONTNEED,
        };

        // SAFETY: the caller guarantees the range is mapped; rounding down to
        // the page start stays within the same mapping.
        let result = madvise(start as *mut libc::c_void, length, advice_flag);
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (start, length, advice);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_maps_to_advice() {
        assert_eq!(MmapAdvice::from(AccessPattern::Sequential), MmapAdvice::Sequential);
        assert_eq!(MmapAdvice::from(AccessPattern::Random), MmapAdvice::Random);
    }

    #[test]
    fn empty_range_is_noop() {
        // SAFETY: zero-length ranges never reach the OS.
        let res = unsafe { advise_raw(std::ptr::null(), 0, MmapAdvice::DontNeed) };
        assert!(res.is_ok());
    }
}
