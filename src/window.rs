//! Per-file mapping window and the bounds-checked views resolved against it.

use crate::errors::{MmapEngineError, Result};
use crate::region::MappedRegion;

/// The mapped window of one file.
///
/// At most one window exists per file; replacing it always passes through
/// `Unmapped` because the old region is released before the new one is mapped.
#[derive(Debug, Default)]
pub enum Window {
    /// No live mapping.
    #[default]
    Unmapped,
    /// A live mapping of `region.len()` bytes starting at `offset`.
    Mapped {
        /// Window start, relative to the engine's slice of the file.
        offset: u64,
        /// Distinguishes this window from every earlier one of the same file.
        generation: u64,
        /// The mapping itself.
        region: MappedRegion,
    },
}

impl Window {
    /// Whether a mapping is live.
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped { .. })
    }

    /// Window start, if mapped.
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::Unmapped => None,
            Self::Mapped { offset, .. } => Some(*offset),
        }
    }

    /// Window length in bytes; zero when unmapped.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Unmapped => 0,
            Self::Mapped { region, .. } => region.len(),
        }
    }

    /// Whether the window holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live region, if mapped.
    #[must_use]
    pub fn region(&self) -> Option<&MappedRegion> {
        match self {
            Self::Unmapped => None,
            Self::Mapped { region, .. } => Some(region),
        }
    }

    /// Reuse test: `[offset, offset+len)` must start inside the window and
    /// end strictly before its last byte boundary. A range ending exactly at
    /// the window end counts as a miss.
    #[must_use]
    pub fn covers(&self, offset: u64, len: u64) -> bool {
        match self {
            Self::Unmapped => false,
            Self::Mapped { offset: start, region, .. } => {
                let end = start + region.len() as u64;
                offset >= *start && offset.checked_add(len).is_some_and(|req_end| req_end < end)
            }
        }
    }

    /// Resolve `[offset, offset+len)` to a view into the window.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if the window is unmapped or the range does not fit inside it.
    pub(crate) fn resolve(&self, offset: u64, len: u64) -> Result<WindowView> {
        let Self::Mapped {
            offset: start,
            generation,
            region,
        } = self
        else {
            return Err(MmapEngineError::OutOfRange { offset, len, extent: 0 });
        };
        let end = start + region.len() as u64;
        let fits = offset >= *start && offset.checked_add(len).is_some_and(|req_end| req_end <= end);
        if !fits {
            return Err(MmapEngineError::OutOfRange { offset, len, extent: end });
        }
        // Both values are bounded by region.len(), which is a usize.
        #[allow(clippy::cast_possible_truncation)]
        let (view_start, view_len) = ((offset - start) as usize, len as usize);
        Ok(WindowView {
            generation: *generation,
            offset,
            start: view_start,
            len: view_len,
        })
    }

    /// Bytes covered by `view`.
    ///
    /// # Errors
    ///
    /// Returns `StaleView` if `view` was resolved against a different window.
    pub(crate) fn bytes(&self, view: &WindowView) -> Result<&[u8]> {
        match self {
            Self::Mapped { generation, region, .. } if *generation == view.generation => {
                Ok(&region.as_slice()[view.start..view.start + view.len])
            }
            _ => Err(MmapEngineError::StaleView),
        }
    }

    /// Mutable bytes covered by `view`.
    ///
    /// # Errors
    ///
    /// Returns `StaleView` for views of another window, `InvalidMode` for read-only windows.
    pub(crate) fn bytes_mut(&mut self, view: &WindowView) -> Result<&mut [u8]> {
        match self {
            Self::Mapped { generation, region, .. } if *generation == view.generation => {
                Ok(&mut region.as_mut_slice()?[view.start..view.start + view.len])
            }
            _ => Err(MmapEngineError::StaleView),
        }
    }

    /// Live region, if `view` belongs to this window.
    pub(crate) fn region_for(&self, view: &WindowView) -> Result<&MappedRegion> {
        match self {
            Self::Mapped { generation, region, .. } if *generation == view.generation => Ok(region),
            _ => Err(MmapEngineError::StaleView),
        }
    }
}

/// A request's resolved location inside one specific window.
///
/// Only the window manager creates views, and a view is only honoured by the
/// window it was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowView {
    generation: u64,
    offset: u64,
    start: usize,
    len: usize,
}

impl WindowView {
    /// Request offset this view was resolved for.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Byte position of the view inside its window.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Length in bytes the view is valid for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view covers no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Generation of the window this view belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
