//! Requests handed to the engine by the workload driver.

use crate::errors::MmapEngineError;
use crate::window::WindowView;

/// Data direction of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Copy from the file into the request buffer.
    Read,
    /// Copy from the request buffer into the file.
    Write,
    /// Flush the file's current window to storage.
    Sync,
}

/// Expected access pattern of the request stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessPattern {
    /// Offsets advance in order.
    #[default]
    Sequential,
    /// Offsets are scattered.
    Random,
}

/// Workload access mode, which selects the protection of new windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protection {
    /// Read-only workload.
    ReadOnly,
    /// Write-only workload.
    WriteOnly,
    /// Write workload whose data is read back for verification.
    VerifyWrite,
    /// Mixed read/write workload.
    #[default]
    ReadWrite,
}

impl Protection {
    /// Whether windows mapped under this mode accept writes.
    #[must_use]
    pub fn writable(self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

/// Workload knobs carried by every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoProfile {
    /// Access pattern, used for the advisory hint on new windows.
    pub pattern: AccessPattern,
    /// Protection used for new windows.
    pub protection: Protection,
    /// Emulate uncached I/O by dropping touched pages after each copy.
    pub direct: bool,
}

/// Outcome of executing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The transfer or flush finished before the call returned.
    Completed,
}

/// A single read, write, or sync request.
///
/// `prepare` fills in the resolved view; `execute` consumes it. Failures of
/// the best-effort flush/advice steps during execute land in [`IoRequest::error`].
#[derive(Debug)]
pub struct IoRequest {
    direction: Direction,
    offset: u64,
    buf: Vec<u8>,
    profile: IoProfile,
    pub(crate) view: Option<WindowView>,
    pub(crate) error: Option<MmapEngineError>,
}

impl IoRequest {
    /// Read `len` bytes at `offset`.
    #[must_use]
    pub fn read(offset: u64, len: usize, profile: IoProfile) -> Self {
        Self::new(Direction::Read, offset, vec![0; len], profile)
    }

    /// Write `data` at `offset`.
    #[must_use]
    pub fn write(offset: u64, data: Vec<u8>, profile: IoProfile) -> Self {
        Self::new(Direction::Write, offset, data, profile)
    }

    /// Flush the file's current window.
    #[must_use]
    pub fn sync(profile: IoProfile) -> Self {
        Self::new(Direction::Sync, 0, Vec::new(), profile)
    }

    fn new(direction: Direction, offset: u64, buf: Vec<u8>, profile: IoProfile) -> Self {
        Self {
            direction,
            offset,
            buf,
            profile,
            view: None,
            error: None,
        }
    }

    /// Direction of the request.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Byte offset within the engine's slice of the file.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Transfer length in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Whether the request transfers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Transfer buffer: the source for writes, the destination for reads.
    #[must_use]
    pub fn buf(&self) -> &[u8] {
        &self.buf
    }

    /// Mutable transfer buffer, for reusing a request across submissions.
    pub fn buf_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// Workload knobs of the request.
    #[must_use]
    pub fn profile(&self) -> IoProfile {
        self.profile
    }

    /// Change the workload knobs. Does not affect an already established window.
    pub fn set_profile(&mut self, profile: IoProfile) {
        self.profile = profile;
    }

    /// Resolved location inside the current window, set by `prepare`.
    #[must_use]
    pub fn view(&self) -> Option<&WindowView> {
        self.view.as_ref()
    }

    /// Error recorded during execute, if any.
    #[must_use]
    pub fn error(&self) -> Option<&MmapEngineError> {
        self.error.as_ref()
    }

    /// Take the recorded error, leaving the slot empty.
    pub fn take_error(&mut self) -> Option<MmapEngineError> {
        self.error.take()
    }

    /// Consume the request and return its buffer.
    #[must_use]
    pub fn into_buf(self) -> Vec<u8> {
        self.buf
    }

    pub(crate) fn record(&mut self, err: MmapEngineError) {
        self.error = Some(err);
    }
}
