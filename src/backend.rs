//! OS primitives the window manager is built on.
//!
//! Every mapping, release, hint, and flush the engine performs goes through
//! a [`MapBackend`], so callers can observe or intercept them.

use std::fs::File;

use crate::advise::MmapAdvice;
use crate::errors::{MmapEngineError, Result};
use crate::region::MappedRegion;
use crate::request::Protection;

/// Mapping, release, advice, and flush primitives.
pub trait MapBackend {
    /// Map `len` bytes of `file` starting at file position `position`.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::MapFailed` if the OS refuses the mapping.
    fn map(&self, file: &File, position: u64, len: usize, protection: Protection) -> Result<MappedRegion>;

    /// Release a region. The region is gone whether or not this succeeds.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::UnmapFailed` if the OS reports a failure.
    fn unmap(&self, region: MappedRegion) -> Result<()>;

    /// Apply `advice` to `[start, start+len)` of `region`.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::AdviceFailed` if the OS refuses the hint.
    fn advise(&self, region: &MappedRegion, start: usize, len: usize, advice: MmapAdvice) -> Result<()>;

    /// Synchronously flush `[start, start+len)` of `region`.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::FlushFailed` if the OS reports a failure.
    fn flush(&self, region: &MappedRegion, start: usize, len: usize) -> Result<()>;
}

/// The real OS, through memmap2 and libc.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBackend;

impl MapBackend for SystemBackend {
    fn map(&self, file: &File, position: u64, len: usize, protection: Protection) -> Result<MappedRegion> {
        MappedRegion::map(file, position, len, protection)
    }

    fn unmap(&self, region: MappedRegion) -> Result<()> {
        region.release().map_err(MmapEngineError::UnmapFailed)
    }

    fn advise(&self, region: &MappedRegion, start: usize, len: usize, advice: MmapAdvice) -> Result<()> {
        region.advise(start, len, advice)
    }

    fn flush(&self, region: &MappedRegion, start: usize, len: usize) -> Result<()> {
        region.flush_range(start, len)
    }
}

impl<B: MapBackend + ?Sized> MapBackend for &B {
    fn map(&self, file: &File, position: u64, len: usize, protection: Protection) -> Result<MappedRegion> {
        (**self).map(file, position, len, protection)
    }

    fn unmap(&self, region: MappedRegion) -> Result<()> {
        (**self).unmap(region)
    }

    fn advise(&self, region: &MappedRegion, start: usize, len: usize, advice: MmapAdvice) -> Result<()> {
        (**self).advise(region, start, len, advice)
    }

    fn flush(&self, region: &MappedRegion, start: usize, len: usize) -> Result<()> {
        (**self).flush(region, start, len)
    }
}
