//! # mmap-engine: memory-mapped transfer engine for I/O workload drivers
//!
//! This crate services read, write, and sync requests against files by copying
//! through a mapped window of each file instead of calling `read()`/`write()`.
//!
//! ## Features
//!
//! - **Sliding windows**: one mapping per file, reused while requests fall inside it
//!   and replaced (release first, then map) on a miss
//! - **Shared budget**: a fixed mapping ceiling split evenly across the workload's files
//! - **Access hints**: sequential or random `madvise` on every new window
//! - **Uncached emulation**: flush and drop the pages touched by each request
//! - **Bounds-checked views**: requests resolve to views only honoured by their own window
//!
//! ## Quick Start
//!
//! ```no_run
//! use mmap_engine::{AccessPattern, EngineFile, IoProfile, IoRequest, MmapEngine, Protection};
//!
//! // Four files share a 1 MiB mapping budget: 256 KiB windows each.
//! let engine = MmapEngine::builder()
//!     .total_budget(1024 * 1024)
//!     .file_count(4)
//!     .build()?;
//!
//! let mut file = EngineFile::open("data.bin", Protection::ReadWrite)?;
//! let profile = IoProfile { pattern: AccessPattern::Random, ..IoProfile::default() };
//!
//! let mut req = IoRequest::write(4096, vec![0xAB; 512], profile);
//! engine.prepare(&mut file, &mut req)?;
//! engine.execute(&mut file, &mut req)?;
//!
//! let mut sync = IoRequest::sync(profile);
//! engine.prepare(&mut file, &mut sync)?;
//! engine.execute(&mut file, &mut sync)?;
//! assert!(sync.error().is_none());
//! # Ok::<(), mmap_engine::MmapEngineError>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: Error types for all engine operations
//! - [`budget`]: Global mapping budget and per-file window size
//! - [`request`]: Requests and workload knobs
//! - [`window`]: Per-file window state and resolved views
//! - [`engine`]: Prepare/execute and the driver-facing engine trait
//! - [`backend`] / [`accounting`]: OS primitives and call accounting

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]

pub mod accounting;
pub mod advise;
pub mod backend;
pub mod budget;
pub mod engine;
pub mod errors;
pub mod file;
pub mod region;
pub mod request;
pub mod utils;
pub mod window;

pub use accounting::{Accounting, MapEvent};
pub use advise::MmapAdvice;
pub use backend::{MapBackend, SystemBackend};
pub use budget::{MapBudget, DEFAULT_TOTAL_BUDGET};
pub use engine::{EngineBuilder, EngineFlags, IoEngine, MmapEngine, ENGINE_NAME};
pub use errors::{MmapEngineError, Result};
pub use file::EngineFile;
pub use region::MappedRegion;
pub use request::{AccessPattern, Completion, Direction, IoProfile, IoRequest, Protection};
pub use window::{Window, WindowView};
