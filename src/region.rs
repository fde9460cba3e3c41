//! One owned memory mapping of a byte range of a file.

use std::fs::File;
use std::io;

use memmap2::{Mmap, MmapMut, MmapOptions};

use crate::advise::{advise_raw, MmapAdvice};
use crate::errors::{MmapEngineError, Result};
use crate::request::Protection;
use crate::utils::ensure_in_extent;

enum MapVariant {
    Ro(Mmap),
    Rw(MmapMut),
}

/// A shared mapping of `[position, position + len)` of a file.
///
/// Dropping the region releases the mapping.
pub struct MappedRegion {
    map: MapVariant,
    position: u64,
    protection: Protection,
}

impl std::fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("position", &self.position)
            .field("len", &self.len())
            .field("protection", &self.protection)
            .finish()
    }
}

impl MappedRegion {
    /// Map `len` bytes of `file` starting at file position `position`.
    ///
    /// Read-only protection maps read-only; every other mode maps
    /// read+write, since write-only pages cannot be expressed.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::MapFailed` with the OS error on failure.
    pub(crate) fn map(file: &File, position: u64, len: usize, protection: Protection) -> Result<Self> {
        let mut opts = MmapOptions::new();
        opts.offset(position).len(len);
        // SAFETY: the engine never extends or truncates the file while a
        // window is live, so the mapped range stays backed by the file.
        let map = unsafe {
            if protection.writable() {
                MapVariant::Rw(opts.map_mut(file).map_err(MmapEngineError::MapFailed)?)
            } else {
                MapVariant::Ro(opts.map(file).map_err(MmapEngineError::MapFailed)?)
            }
        };
        Ok(Self {
            map,
            position,
            protection,
        })
    }

    /// File position of the first mapped byte.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Mapped length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.map {
            MapVariant::Ro(m) => m.len(),
            MapVariant::Rw(m) => m.len(),
        }
    }

    /// Whether the region maps no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Protection the region was mapped for.
    #[must_use]
    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Whole region as a byte slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        match &self.map {
            MapVariant::Ro(m) => &m[..],
            MapVariant::Rw(m) => &m[..],
        }
    }

    /// Whole region as a mutable byte slice.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::InvalidMode` for read-only regions.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        match &mut self.map {
            MapVariant::Ro(_) => Err(MmapEngineError::InvalidMode("write to read-only window")),
            MapVariant::Rw(m) => Ok(&mut m[..]),
        }
    }

    /// Synchronously flush `[start, start+len)` of the region. Read-only
    /// regions have nothing to flush.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for ranges outside the region, `FlushFailed` if `msync` fails.
    pub fn flush_range(&self, start: usize, len: usize) -> Result<()> {
        ensure_in_extent(start as u64, len as u64, self.len() as u64)?;
        if len == 0 {
            return Ok(());
        }
        match &self.map {
            MapVariant::Ro(_) => Ok(()),
            MapVariant::Rw(m) => m.flush_range(start, len).map_err(MmapEngineError::FlushFailed),
        }
    }

    /// Advise the OS about `[start, start+len)` of the region.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` for ranges outside the region, `AdviceFailed` if `madvise` fails.
    pub fn advise(&self, start: usize, len: usize, advice: MmapAdvice) -> Result<()> {
        ensure_in_extent(start as u64, len as u64, self.len() as u64)?;
        let base = self.as_slice().as_ptr();
        // SAFETY: the range was validated against this live mapping.
        unsafe { advise_raw(base.add(start), len, advice) }.map_err(MmapEngineError::AdviceFailed)
    }

    /// Release the mapping.
    ///
    /// # Errors
    ///
    /// Reserved for `UnmapFailed`; memmap2 releases mappings on drop and
    /// does not report `munmap` failures.
    pub(crate) fn release(self) -> io::Result<()> {
        drop(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::path::PathBuf;

    fn tmp_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("mmap_engine_region_test_{}_{}", name, std::process::id()));
        p
    }

    fn rw_file(name: &str, size: u64) -> (PathBuf, File) {
        let path = tmp_path(name);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .expect("create");
        file.set_len(size).expect("set_len");
        (path, file)
    }

    #[test]
    fn maps_unaligned_position() {
        let (path, file) = rw_file("unaligned", 16384);
        let mut region = MappedRegion::map(&file, 4099, 100, Protection::ReadWrite).expect("map");
        assert_eq!(region.position(), 4099);
        assert_eq!(region.len(), 100);
        region.as_mut_slice().expect("rw")[..3].copy_from_slice(b"abc");
        region.flush_range(0, 3).expect("flush");
        region.advise(0, 3, MmapAdvice::DontNeed).expect("dontneed");
        assert_eq!(&region.as_slice()[..3], b"abc");
        drop(region);

        let bytes = std::fs::read(&path).expect("read back");
        assert_eq!(&bytes[4099..4102], b"abc");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn read_only_region_rejects_writes() {
        let (path, file) = rw_file("read_only", 4096);
        let mut region = MappedRegion::map(&file, 0, 4096, Protection::ReadOnly).expect("map");
        assert!(matches!(region.as_mut_slice(), Err(MmapEngineError::InvalidMode(_))));
        region.flush_range(0, 4096).expect("ro flush is a no-op");
        assert!(region.flush_range(1, 4096).is_err());
        assert!(region.advise(4000, 200, MmapAdvice::Random).is_err());
        region.release().expect("release");
        let _ = std::fs::remove_file(&path);
    }
}
