//! In-memory mock filesystem for testing the sampler without a cgroup2 mount.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files and directories in memory, allowing tests to build cgroup
/// trees and to make individual files vanish between ticks.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a single file. Returns `true` if it existed.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> bool {
        self.files.remove(path.as_ref()).is_some()
    }

    /// Adds a cgroup directory with `memory.current` and `memory.low`.
    pub fn add_cgroup(&mut self, dir: impl AsRef<Path>, current: i64, low: i64) {
        let dir = dir.as_ref();
        self.add_dir(dir);
        self.add_file(dir.join("memory.current"), format!("{}\n", current));
        self.add_file(dir.join("memory.low"), format!("{}\n", low));
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        // Find all files and directories that are direct children
        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/fs/cgroup/memory.pressure", "some avg10=0.00\n");

        assert!(fs.exists(Path::new("/sys/fs/cgroup/memory.pressure")));
        assert!(fs.is_dir(Path::new("/sys/fs/cgroup")));

        let content = fs
            .read_to_string(Path::new("/sys/fs/cgroup/memory.pressure"))
            .unwrap();
        assert_eq!(content, "some avg10=0.00\n");
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_cgroup("/cg/a.slice", 10, 0);
        fs.add_cgroup("/cg/b.slice", 20, 0);
        fs.add_file("/cg/cgroup.controllers", "memory\n");

        let root_entries = fs.read_dir(Path::new("/cg")).unwrap();
        assert_eq!(root_entries.len(), 3); // two cgroups and cgroup.controllers

        let a_entries = fs.read_dir(Path::new("/cg/a.slice")).unwrap();
        assert_eq!(a_entries.len(), 2); // memory.current and memory.low
    }

    #[test]
    fn test_mock_fs_remove_file() {
        let mut fs = MockFs::new();
        fs.add_cgroup("/cg/a.slice", 10, 0);

        assert!(fs.remove_file("/cg/a.slice/memory.current"));
        assert!(!fs.remove_file("/cg/a.slice/memory.current"));
        assert!(fs.is_dir(Path::new("/cg/a.slice")));
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(fs.read_dir(Path::new("/nonexistent")).is_err());
    }
}
