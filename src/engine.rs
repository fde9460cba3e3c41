//! The memory-mapped transfer engine: window management, copies, and flushes.

use std::path::Path;
use std::sync::Arc;

use log::{debug, error, trace, warn};

use crate::advise::MmapAdvice;
use crate::backend::{MapBackend, SystemBackend};
use crate::budget::{MapBudget, DEFAULT_TOTAL_BUDGET};
use crate::errors::{MmapEngineError, Result};
use crate::file::EngineFile;
use crate::request::{Completion, Direction, IoProfile, IoRequest, Protection};
use crate::utils::{ensure_in_extent, to_usize};
use crate::window::Window;

/// Name the engine registers under.
pub const ENGINE_NAME: &str = "mmap";

/// Capabilities an engine advertises to the workload driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineFlags {
    /// Every request completes before `queue` returns.
    pub sync_io: bool,
    /// Writes never grow the target file.
    pub no_extend: bool,
}

/// Interface a workload driver uses to run requests through an engine.
pub trait IoEngine {
    /// Engine name used for registration.
    fn name(&self) -> &'static str;

    /// Advertised capabilities.
    fn flags(&self) -> EngineFlags;

    /// Open a target file for the given workload mode.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::Io` if the file cannot be opened.
    fn open_file(&self, path: &Path, protection: Protection) -> Result<EngineFile>;

    /// Release any engine state attached to `file`.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::UnmapFailed` if a live window cannot be released.
    fn close_file(&self, file: &mut EngineFile) -> Result<()>;

    /// Current on-disk size of `file`.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::Io` if metadata cannot be read.
    fn file_size(&self, file: &EngineFile) -> Result<u64>;

    /// Make `req` ready to run.
    ///
    /// # Errors
    ///
    /// Engine-specific; the request must not be queued on error.
    fn prepare(&self, file: &mut EngineFile, req: &mut IoRequest) -> Result<()>;

    /// Run a prepared request.
    ///
    /// # Errors
    ///
    /// Engine-specific; best-effort failures are recorded on the request instead.
    fn queue(&self, file: &mut EngineFile, req: &mut IoRequest) -> Result<Completion>;
}

/// Synchronous engine that transfers data through a sliding mapped window
/// of each file.
///
/// # Examples
///
/// ```no_run
/// use mmap_engine::{EngineFile, IoProfile, IoRequest, MmapEngine, Protection};
///
/// let engine = MmapEngine::builder().total_budget(64 * 1024).file_count(1).build()?;
/// let mut file = EngineFile::open("data.bin", Protection::ReadWrite)?;
///
/// let mut req = IoRequest::write(0, b"hello".to_vec(), IoProfile::default());
/// engine.prepare(&mut file, &mut req)?;
/// engine.execute(&mut file, &mut req)?;
///
/// let mut req = IoRequest::read(0, 5, IoProfile::default());
/// engine.prepare(&mut file, &mut req)?;
/// engine.execute(&mut file, &mut req)?;
/// assert_eq!(req.buf(), b"hello");
/// # Ok::<(), mmap_engine::MmapEngineError>(())
/// ```
#[derive(Debug)]
pub struct MmapEngine<B = SystemBackend> {
    budget: Arc<MapBudget>,
    backend: B,
}

impl MmapEngine {
    /// Start configuring an engine backed by the real OS.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

impl<B: MapBackend> MmapEngine<B> {
    /// Create an engine around an already computed budget.
    pub fn new(budget: Arc<MapBudget>, backend: B) -> Self {
        Self { budget, backend }
    }

    /// Budget this engine sizes windows from.
    #[must_use]
    pub fn budget(&self) -> &MapBudget {
        &self.budget
    }

    /// Backend used for OS primitives.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Make sure `file`'s window covers `req` and record the resolved view
    /// on the request.
    ///
    /// Sync requests need no view and leave the window untouched.
    ///
    /// # Errors
    ///
    /// - `RequestTooLarge` if the request exceeds the window size; nothing is mapped.
    /// - `OutOfRange` if the request reaches past the file's I/O extent or starts
    ///   where no bytes remain to map; nothing is mapped and the window is kept.
    /// - `UnmapFailed`, `MapFailed`, `AdviceFailed` from window replacement; the
    ///   file is left unmapped.
    pub fn prepare(&self, file: &mut EngineFile, req: &mut IoRequest) -> Result<()> {
        req.view = None;
        if req.direction() == Direction::Sync {
            return Ok(());
        }

        let offset = req.offset();
        let len = req.len();
        let window_size = self.budget.window_size();
        if len > window_size {
            error!("block size {len} too big for mmap engine window of {window_size} bytes");
            return Err(MmapEngineError::RequestTooLarge { len, window_size });
        }
        ensure_in_extent(offset, len, file.io_size())?;
        // A miss here would map zero bytes; reject before the live window is released.
        if window_size.min(file.io_size() - offset) == 0 {
            return Err(MmapEngineError::OutOfRange {
                offset,
                len,
                extent: file.io_size(),
            });
        }

        if file.window.covers(offset, len) {
            trace!("{}: window hit at {offset}+{len}", file.path().display());
        } else {
            self.release_window(file)?;
            self.establish_window(file, offset, req.profile())?;
        }

        req.view = Some(file.window.resolve(offset, len)?);
        Ok(())
    }

    /// Perform the copy or flush for a prepared request.
    ///
    /// Reads copy out of the window, writes copy into it, and syncs flush the
    /// whole current window. With `direct` set, reads and writes then flush
    /// and drop just the touched bytes. Flush and drop failures are recorded
    /// on the request and do not fail the call.
    ///
    /// # Errors
    ///
    /// - `InvalidMode` for writes under a read-only profile.
    /// - `NotPrepared` / `StaleView` if the request has no view for the current window.
    pub fn execute(&self, file: &mut EngineFile, req: &mut IoRequest) -> Result<Completion> {
        let profile = req.profile();
        let direction = req.direction();
        match direction {
            Direction::Read => {
                let view = req.view.ok_or(MmapEngineError::NotPrepared)?;
                let src = file.window.bytes(&view)?;
                req.buf_mut().copy_from_slice(src);
            }
            Direction::Write => {
                if !profile.protection.writable() {
                    return Err(MmapEngineError::InvalidMode("write request on read-only workload"));
                }
                let view = req.view.ok_or(MmapEngineError::NotPrepared)?;
                file.window.bytes_mut(&view)?.copy_from_slice(req.buf());
            }
            Direction::Sync => {
                if let Some(region) = file.window.region() {
                    if let Err(err) = self.backend.flush(region, 0, region.len()) {
                        warn!("{}: msync of window failed: {err}", file.path().display());
                        req.record(err);
                    }
                }
            }
        }

        if profile.direct && direction != Direction::Sync {
            self.drop_cached(file, req)?;
        }
        Ok(Completion::Completed)
    }

    /// Release `file`'s window, if any.
    ///
    /// # Errors
    ///
    /// Returns `UnmapFailed` if the release fails; the window is cleared regardless.
    pub fn close_file(&self, file: &mut EngineFile) -> Result<()> {
        self.release_window(file)
    }

    fn release_window(&self, file: &mut EngineFile) -> Result<()> {
        if let Window::Mapped { offset, region, .. } = std::mem::take(&mut file.window) {
            debug!(
                "{}: releasing window {offset}+{}",
                file.path().display(),
                region.len()
            );
            self.backend.unmap(region)?;
        }
        Ok(())
    }

    fn establish_window(&self, file: &mut EngineFile, offset: u64, profile: IoProfile) -> Result<()> {
        let window_len = self.budget.window_size().min(file.io_size() - offset);
        let len = to_usize(offset, window_len)?;
        let position = file.file_offset() + offset;

        let region = self.backend.map(file.file(), position, len, profile.protection)?;
        let advice = MmapAdvice::from(profile.pattern);
        if let Err(err) = self.backend.advise(&region, 0, len, advice) {
            if let Err(unmap_err) = self.backend.unmap(region) {
                warn!("{}: releasing unadvised window failed: {unmap_err}", file.path().display());
            }
            return Err(err);
        }

        debug!(
            "{}: mapped window {offset}+{len} at file position {position} ({:?}, {:?})",
            file.path().display(),
            profile.protection,
            advice
        );
        file.window = Window::Mapped {
            offset,
            generation: EngineFile::next_generation(),
            region,
        };
        Ok(())
    }

    fn drop_cached(&self, file: &EngineFile, req: &mut IoRequest) -> Result<()> {
        let view = req.view.ok_or(MmapEngineError::NotPrepared)?;
        let region = file.window.region_for(&view)?;
        if let Err(err) = self.backend.flush(region, view.start(), view.len()) {
            warn!("{}: msync of request range failed: {err}", file.path().display());
            req.record(err);
        }
        if let Err(err) = self.backend.advise(region, view.start(), view.len(), MmapAdvice::DontNeed) {
            warn!("{}: dropping cached pages failed: {err}", file.path().display());
            req.record(err);
        }
        Ok(())
    }
}

impl<B: MapBackend> IoEngine for MmapEngine<B> {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn flags(&self) -> EngineFlags {
        EngineFlags {
            sync_io: true,
            no_extend: true,
        }
    }

    fn open_file(&self, path: &Path, protection: Protection) -> Result<EngineFile> {
        EngineFile::open(path, protection)
    }

    fn close_file(&self, file: &mut EngineFile) -> Result<()> {
        MmapEngine::<B>::close_file(self, file)
    }

    fn file_size(&self, file: &EngineFile) -> Result<u64> {
        Ok(file.file().metadata()?.len())
    }

    fn prepare(&self, file: &mut EngineFile, req: &mut IoRequest) -> Result<()> {
        MmapEngine::<B>::prepare(self, file, req)
    }

    fn queue(&self, file: &mut EngineFile, req: &mut IoRequest) -> Result<Completion> {
        self.execute(file, req)
    }
}

/// Configuration for an [`MmapEngine`].
#[derive(Debug, Clone)]
pub struct EngineBuilder<B = SystemBackend> {
    total_budget: u64,
    file_count: usize,
    backend: B,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            total_budget: DEFAULT_TOTAL_BUDGET,
            file_count: 1,
            backend: SystemBackend,
        }
    }
}

impl<B: MapBackend> EngineBuilder<B> {
    /// Total bytes that may be mapped at once across all files.
    #[must_use]
    pub fn total_budget(mut self, bytes: u64) -> Self {
        self.total_budget = bytes;
        self
    }

    /// Number of files the workload touches.
    #[must_use]
    pub fn file_count(mut self, files: usize) -> Self {
        self.file_count = files;
        self
    }

    /// Use a different backend for OS primitives.
    #[must_use]
    pub fn backend<B2: MapBackend>(self, backend: B2) -> EngineBuilder<B2> {
        EngineBuilder {
            total_budget: self.total_budget,
            file_count: self.file_count,
            backend,
        }
    }

    /// Divide the budget across the files and create the engine.
    ///
    /// # Errors
    ///
    /// Returns `MmapEngineError::NoFiles` if the file count is zero.
    pub fn build(self) -> Result<MmapEngine<B>> {
        let budget = MapBudget::new(self.total_budget, self.file_count)?;
        debug!(
            "mmap engine: {} bytes over {} files, window {} bytes",
            budget.total(),
            budget.file_count(),
            budget.window_size()
        );
        Ok(MmapEngine::new(Arc::new(budget), self.backend))
    }
}
