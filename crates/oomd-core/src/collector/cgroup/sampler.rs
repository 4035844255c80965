//! Cgroup v2 memory sampler.

use std::io;

use crate::collector::traits::{FileSystem, Sampler};
use crate::context::MemoryPressure;
use crate::path::CgroupPath;

use super::parser;

/// Sampler backed by the cgroup v2 filesystem.
///
/// Usage comes from `memory.current`; protection is the larger of
/// `memory.low` and `memory.min` (`memory.min` is optional, older kernels
/// lack it); pressure comes from `memory.pressure`.
pub struct CgroupSampler<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> CgroupSampler<F> {
    /// Creates a new sampler over `fs`.
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Mutable access to the filesystem, used by tests to change files
    /// between ticks.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    fn read_value(&self, path: &CgroupPath, file: &str) -> io::Result<i64> {
        let file_path = path.absolute_path().join(file);
        let content = self.fs.read_to_string(&file_path)?;
        parser::parse_memory_value(&content).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unparsable {:?}: {:?}", file_path, content.trim()),
            )
        })
    }
}

impl<F: FileSystem> Sampler for CgroupSampler<F> {
    fn exists(&self, path: &CgroupPath) -> bool {
        self.fs.is_dir(&path.absolute_path())
    }

    fn list_children(&self, path: &CgroupPath) -> io::Result<Vec<String>> {
        let mut children: Vec<String> = self
            .fs
            .read_dir(&path.absolute_path())?
            .into_iter()
            .filter(|entry| self.fs.is_dir(entry))
            .filter_map(|entry| {
                entry
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .collect();
        children.sort();
        Ok(children)
    }

    fn read_usage(&self, path: &CgroupPath) -> io::Result<i64> {
        self.read_value(path, "memory.current")
    }

    fn read_protection_limit(&self, path: &CgroupPath) -> io::Result<i64> {
        let low = self.read_value(path, "memory.low")?;
        let min = match self.read_value(path, "memory.min") {
            Ok(min) => min,
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e),
        };
        Ok(low.max(min))
    }

    fn read_pressure(&self, path: &CgroupPath) -> io::Result<MemoryPressure> {
        let file_path = path.absolute_path().join("memory.pressure");
        let content = self.fs.read_to_string(&file_path)?;
        parser::parse_memory_pressure(&content).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unparsable {:?}", file_path),
            )
        })
    }
}
