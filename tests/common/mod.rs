//! Shared helpers for mmap-engine integration tests.
#![allow(dead_code)]

use std::cell::Cell;
use std::fs::File;
use std::io::{self, Write};

use mmap_engine::{
    Accounting, EngineFile, MapBackend, MappedRegion, MmapAdvice, MmapEngine, MmapEngineError,
    Protection, Result, SystemBackend,
};
use tempfile::NamedTempFile;

/// Real backend with switchable failures.
#[derive(Debug, Default)]
pub struct FaultyBackend {
    pub fail_map: Cell<bool>,
    pub fail_unmap: Cell<bool>,
    pub fail_advice: Cell<Option<MmapAdvice>>,
    pub fail_flush: Cell<bool>,
}

impl MapBackend for FaultyBackend {
    fn map(&self, file: &File, position: u64, len: usize, protection: Protection) -> Result<MappedRegion> {
        if self.fail_map.get() {
            return Err(MmapEngineError::MapFailed(io::Error::from_raw_os_error(libc::ENOMEM)));
        }
        SystemBackend.map(file, position, len, protection)
    }

    fn unmap(&self, region: MappedRegion) -> Result<()> {
        SystemBackend.unmap(region)?;
        if self.fail_unmap.get() {
            return Err(MmapEngineError::UnmapFailed(io::Error::from_raw_os_error(libc::EINVAL)));
        }
        Ok(())
    }

    fn advise(&self, region: &MappedRegion, start: usize, len: usize, advice: MmapAdvice) -> Result<()> {
        if self.fail_advice.get() == Some(advice) {
            return Err(MmapEngineError::AdviceFailed(io::Error::from_raw_os_error(libc::EAGAIN)));
        }
        SystemBackend.advise(region, start, len, advice)
    }

    fn flush(&self, region: &MappedRegion, start: usize, len: usize) -> Result<()> {
        if self.fail_flush.get() {
            return Err(MmapEngineError::FlushFailed(io::Error::from_raw_os_error(libc::EIO)));
        }
        SystemBackend.flush(region, start, len)
    }
}

/// Deterministic byte pattern.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

/// Temp file of `size` bytes filled with `pattern(size, 0)`.
pub fn data_file(size: usize) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("tmp");
    tmp.write_all(&pattern(size, 0)).expect("fill");
    tmp.flush().expect("flush");
    tmp
}

/// Engine over the real OS with call accounting.
pub fn engine(total: u64, files: usize) -> MmapEngine<Accounting> {
    MmapEngine::builder()
        .total_budget(total)
        .file_count(files)
        .backend(Accounting::new(SystemBackend))
        .build()
        .expect("engine")
}

/// Engine whose backend can be told to fail.
pub fn faulty_engine(total: u64, files: usize) -> MmapEngine<Accounting<FaultyBackend>> {
    MmapEngine::builder()
        .total_budget(total)
        .file_count(files)
        .backend(Accounting::new(FaultyBackend::default()))
        .build()
        .expect("engine")
}

/// Open `tmp` read-write for the engine.
pub fn open_rw(tmp: &NamedTempFile) -> EngineFile {
    EngineFile::open(tmp.path(), Protection::ReadWrite).expect("open")
}
