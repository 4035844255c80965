//! Abstractions over the data sources the core reads from.
//!
//! `FileSystem` lets the cgroup sampler work with both the real cgroup2
//! mount on Linux and an in-memory mock in tests. `Sampler` is the boundary
//! the update protocol talks to: it hands out parsed values only.

use std::io;
use std::path::{Path, PathBuf};

use crate::context::MemoryPressure;
use crate::path::CgroupPath;

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Checks if a path exists and is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of paths to entries in the directory, or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

/// Point-in-time source of per-cgroup memory data.
///
/// All reads are synchronous. An `Err` from a read means the value is not
/// available this tick (the cgroup may have been removed between discovery
/// and read); callers decide how to degrade.
pub trait Sampler {
    /// True if the cgroup (or hierarchy root) currently exists.
    fn exists(&self, path: &CgroupPath) -> bool;

    /// Names of the child cgroups directly below `path`.
    fn list_children(&self, path: &CgroupPath) -> io::Result<Vec<String>>;

    /// Current memory usage in bytes.
    fn read_usage(&self, path: &CgroupPath) -> io::Result<i64>;

    /// Configured memory protection in bytes (0 when unset).
    fn read_protection_limit(&self, path: &CgroupPath) -> io::Result<i64>;

    /// Memory pressure stall information, if the source provides it.
    fn read_pressure(&self, path: &CgroupPath) -> io::Result<MemoryPressure> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no pressure data for {}", path),
        ))
    }
}
