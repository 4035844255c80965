//! oomd-core - decision core of the oomd memory daemon.
//!
//! Provides:
//! - `path` - cgroup path model with glob segments for discovery
//! - `resolver` - wildcard expansion and ancestor closure
//! - `collector` - sampling collaborator (cgroup v2 files, mock filesystem)
//! - `context` - per-cgroup smoothed state and the context store
//! - `overage` - hierarchical protection overage calculation
//! - `oomd` - the per-tick update protocol tying the pieces together
//! - `fmt` - shared formatting helpers (bytes)

pub mod collector;
pub mod context;
pub mod error;
pub mod fmt;
pub mod oomd;
pub mod overage;
pub mod path;
pub mod resolver;

pub use context::{CgroupContext, MemoryPressure, OomdContext};
pub use error::CoreError;
pub use oomd::{AverageSeed, Oomd, UpdateStats};
pub use path::CgroupPath;
