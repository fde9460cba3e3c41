//! Target files and the slice of each that one engine instance services.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::Result;
use crate::request::Protection;
use crate::utils::ensure_in_extent;
use crate::window::Window;

// Process-wide rather than per engine: several engines (one per worker) may
// serve files concurrently, and a view resolved by one must never match a
// window created by another.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// An open target file plus its window state.
///
/// The engine only touches `[file_offset, file_offset + io_size)` of the file
/// and never changes the file's length. Request offsets are relative to
/// `file_offset`.
#[derive(Debug)]
pub struct EngineFile {
    path: PathBuf,
    file: File,
    size: u64,
    file_offset: u64,
    io_size: u64,
    pub(crate) window: Window,
}

impl EngineFile {
    /// Open an existing file for the given workload mode. Nothing is created
    /// or truncated. The I/O extent defaults to the whole file.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::Io` if opening or querying metadata fails.
    pub fn open<P: AsRef<Path>>(path: P, protection: Protection) -> Result<Self> {
        let path_ref = path.as_ref();
        // Writable mappings need a descriptor opened for reading too.
        let file = OpenOptions::new()
            .read(true)
            .write(protection.writable())
            .open(path_ref)?;
        let size = file.metadata()?.len();
        Ok(Self {
            path: path_ref.to_path_buf(),
            file,
            size,
            file_offset: 0,
            io_size: size,
            window: Window::Unmapped,
        })
    }

    /// Restrict the engine to `io_size` bytes starting at `file_offset`.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::OutOfRange` if the slice reaches past the end
    /// of the file; files are never extended.
    pub fn with_extent(mut self, file_offset: u64, io_size: u64) -> Result<Self> {
        ensure_in_extent(file_offset, io_size, self.size)?;
        self.file_offset = file_offset;
        self.io_size = io_size;
        Ok(self)
    }

    /// Path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying descriptor.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// File size discovered at open.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Leading bytes of the file that belong to someone else.
    #[must_use]
    pub fn file_offset(&self) -> u64 {
        self.file_offset
    }

    /// Bytes this engine may touch, starting at `file_offset`.
    #[must_use]
    pub fn io_size(&self) -> u64 {
        self.io_size
    }

    /// Current window.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub(crate) fn next_generation() -> u64 {
        NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MmapEngineError;

    #[test]
    fn open_discovers_size() {
        let tmp = tempfile::NamedTempFile::new().expect("tmp");
        tmp.as_file().set_len(12_345).expect("set_len");

        let file = EngineFile::open(tmp.path(), Protection::ReadOnly).expect("open");
        assert_eq!(file.size(), 12_345);
        assert_eq!(file.io_size(), 12_345);
        assert_eq!(file.file_offset(), 0);
        assert!(!file.window().is_mapped());
    }

    #[test]
    fn extent_must_fit_in_file() {
        let tmp = tempfile::NamedTempFile::new().expect("tmp");
        tmp.as_file().set_len(1000).expect("set_len");

        let file = EngineFile::open(tmp.path(), Protection::ReadWrite)
            .expect("open")
            .with_extent(200, 800)
            .expect("extent");
        assert_eq!(file.file_offset(), 200);
        assert_eq!(file.io_size(), 800);

        let err = EngineFile::open(tmp.path(), Protection::ReadWrite)
            .expect("open")
            .with_extent(200, 801)
            .expect_err("past end of file");
        assert!(matches!(err, MmapEngineError::OutOfRange { .. }));
        assert_eq!(std::fs::metadata(tmp.path()).expect("meta").len(), 1000);
    }

    #[test]
    fn missing_file_is_not_created() {
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("absent.bin");
        assert!(matches!(
            EngineFile::open(&path, Protection::WriteOnly),
            Err(MmapEngineError::Io(_))
        ));
        assert!(!path.exists());
    }
}
