//! Call accounting for a [`MapBackend`].

use std::fs::File;

use parking_lot::Mutex;

use crate::advise::MmapAdvice;
use crate::backend::{MapBackend, SystemBackend};
use crate::errors::Result;
use crate::region::MappedRegion;
use crate::request::Protection;

/// One call observed by [`Accounting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// A mapping was established.
    Map {
        /// File position of the first mapped byte.
        position: u64,
        /// Mapped length.
        len: usize,
        /// Requested protection.
        protection: Protection,
    },
    /// A mapping was released.
    Unmap {
        /// File position of the released mapping.
        position: u64,
        /// Released length.
        len: usize,
    },
    /// An advisory hint was applied.
    Advise {
        /// Region-relative start.
        start: usize,
        /// Advised length.
        len: usize,
        /// Hint given.
        advice: MmapAdvice,
    },
    /// A range was flushed.
    Flush {
        /// Region-relative start.
        start: usize,
        /// Flushed length.
        len: usize,
    },
}

#[derive(Debug, Default)]
struct Ledger {
    events: Vec<MapEvent>,
    live: usize,
    peak_live: usize,
}

/// Wraps a backend and records every call plus live mapping counts.
///
/// Only successful maps and every attempted unmap change the live count.
#[derive(Debug, Default)]
pub struct Accounting<B = SystemBackend> {
    inner: B,
    ledger: Mutex<Ledger>,
}

impl<B: MapBackend> Accounting<B> {
    /// Wrap `inner`.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<MapEvent> {
        self.ledger.lock().events.clone()
    }

    /// Number of recorded map calls.
    pub fn maps(&self) -> usize {
        self.count(|e| matches!(e, MapEvent::Map { .. }))
    }

    /// Number of recorded unmap calls.
    pub fn unmaps(&self) -> usize {
        self.count(|e| matches!(e, MapEvent::Unmap { .. }))
    }

    /// Mappings currently alive.
    pub fn live(&self) -> usize {
        self.ledger.lock().live
    }

    /// Highest number of mappings alive at once.
    pub fn peak_live(&self) -> usize {
        self.ledger.lock().peak_live
    }

    /// Forget recorded events; live counts are kept.
    pub fn clear_events(&self) {
        self.ledger.lock().events.clear();
    }

    fn count(&self, pred: impl Fn(&MapEvent) -> bool) -> usize {
        self.ledger.lock().events.iter().filter(|e| pred(*e)).count()
    }
}

impl<B: MapBackend> MapBackend for Accounting<B> {
    fn map(&self, file: &File, position: u64, len: usize, protection: Protection) -> Result<MappedRegion> {
        let region = self.inner.map(file, position, len, protection)?;
        let mut ledger = self.ledger.lock();
        ledger.events.push(MapEvent::Map {
            position,
            len,
            protection,
        });
        ledger.live += 1;
        ledger.peak_live = ledger.peak_live.max(ledger.live);
        Ok(region)
    }

    fn unmap(&self, region: MappedRegion) -> Result<()> {
        {
            let mut ledger = self.ledger.lock();
            ledger.events.push(MapEvent::Unmap {
                position: region.position(),
                len: region.len(),
            });
            ledger.live = ledger.live.saturating_sub(1);
        }
        self.inner.unmap(region)
    }

    fn advise(&self, region: &MappedRegion, start: usize, len: usize, advice: MmapAdvice) -> Result<()> {
        self.ledger.lock().events.push(MapEvent::Advise { start, len, advice });
        self.inner.advise(region, start, len, advice)
    }

    fn flush(&self, region: &MappedRegion, start: usize, len: usize) -> Result<()> {
        self.ledger.lock().events.push(MapEvent::Flush { start, len });
        self.inner.flush(region, start, len)
    }
}
