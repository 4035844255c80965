//! Cgroup path model.
//!
//! A [`CgroupPath`] is a hierarchy root (the cgroup2 mount, e.g.
//! `/sys/fs/cgroup`) plus a relative path split into segments. Segments may be
//! glob patterns (`*`, `*.slice`) until the path is resolved against the live
//! hierarchy; resolved paths are wildcard-free and serve as store keys.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Characters that turn a segment into a glob pattern.
const GLOB_CHARS: &[char] = &['*', '?', '['];

/// Identifies a cgroup by hierarchy root and relative path.
///
/// Ordering is by root, then segment by segment, so a parent always sorts
/// before its descendants.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CgroupPath {
    root: String,
    segments: Vec<String>,
}

impl CgroupPath {
    /// Creates a path from a root and a `/`-separated relative path.
    ///
    /// Empty segments and leading/trailing slashes are dropped, so
    /// `"/system.slice//foo.service/"` and `"system.slice/foo.service"` are
    /// the same path.
    pub fn new(root: impl Into<String>, relative: &str) -> Self {
        let segments = relative
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self::from_segments(root, segments)
    }

    /// Creates the path of the hierarchy root itself.
    pub fn root_of(root: impl Into<String>) -> Self {
        Self::from_segments(root, Vec::new())
    }

    pub(crate) fn from_segments(root: impl Into<String>, segments: Vec<String>) -> Self {
        let mut root = root.into();
        while root.len() > 1 && root.ends_with('/') {
            root.pop();
        }
        Self { root, segments }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Relative path joined with `/`, empty for the hierarchy root.
    pub fn relative_path(&self) -> String {
        self.segments.join("/")
    }

    /// Filesystem location of the cgroup directory.
    pub fn absolute_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.root);
        for segment in &self.segments {
            path.push(segment);
        }
        path
    }

    /// Last segment, `None` for the hierarchy root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| is_glob_segment(s))
    }

    /// Immediate parent, `None` for the hierarchy root.
    ///
    /// The parent of a top-level cgroup is the hierarchy root.
    pub fn parent(&self) -> Option<CgroupPath> {
        if self.segments.is_empty() {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        Some(Self {
            root: self.root.clone(),
            segments,
        })
    }

    pub fn child(&self, name: &str) -> CgroupPath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self {
            root: self.root.clone(),
            segments,
        }
    }

    /// Strict ancestors below the hierarchy root, top-level first.
    pub fn ancestors(&self) -> Vec<CgroupPath> {
        (1..self.segments.len())
            .map(|depth| Self {
                root: self.root.clone(),
                segments: self.segments[..depth].to_vec(),
            })
            .collect()
    }

    /// True if `self` is a strict ancestor of `other` in the same hierarchy.
    pub fn is_ancestor_of(&self, other: &CgroupPath) -> bool {
        self.root == other.root
            && self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for CgroupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:/{}", self.root, self.relative_path())
    }
}

/// True if the segment has to be matched against directory entries.
pub fn is_glob_segment(segment: &str) -> bool {
    segment.contains(GLOB_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_normalizes_segments() {
        let a = CgroupPath::new("/sys/fs/cgroup/", "/system.slice//foo.service/");
        let b = CgroupPath::new("/sys/fs/cgroup", "system.slice/foo.service");
        assert_eq!(a, b);
        assert_eq!(a.relative_path(), "system.slice/foo.service");
        assert_eq!(a.depth(), 2);
        assert_eq!(a.name(), Some("foo.service"));
    }

    #[test]
    fn test_equal_paths_hash_once() {
        let mut set = HashSet::new();
        set.insert(CgroupPath::new("/cg", "a/b"));
        set.insert(CgroupPath::new("/cg/", "a/b/"));
        set.insert(CgroupPath::new("/other", "a/b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_parent_chain() {
        let path = CgroupPath::new("/cg", "a/b/c");
        let parent = path.parent().unwrap();
        assert_eq!(parent, CgroupPath::new("/cg", "a/b"));
        let top = CgroupPath::new("/cg", "a");
        assert!(top.parent().unwrap().is_root());
        assert!(CgroupPath::root_of("/cg").parent().is_none());
    }

    #[test]
    fn test_ancestors_top_level_first() {
        let path = CgroupPath::new("/cg", "a/b/c");
        assert_eq!(
            path.ancestors(),
            vec![CgroupPath::new("/cg", "a"), CgroupPath::new("/cg", "a/b")]
        );
        assert!(CgroupPath::new("/cg", "a").ancestors().is_empty());
    }

    #[test]
    fn test_is_ancestor_of() {
        let a = CgroupPath::new("/cg", "a");
        let abc = CgroupPath::new("/cg", "a/b/c");
        assert!(a.is_ancestor_of(&abc));
        assert!(!abc.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&CgroupPath::new("/other", "a/b")));
        assert!(!a.is_ancestor_of(&CgroupPath::new("/cg", "ab/c")));
    }

    #[test]
    fn test_wildcards() {
        assert!(CgroupPath::new("/cg", "system.slice/*").has_wildcard());
        assert!(CgroupPath::new("/cg", "*.slice/foo").has_wildcard());
        assert!(!CgroupPath::new("/cg", "system.slice/foo.service").has_wildcard());
    }

    #[test]
    fn test_absolute_path_and_display() {
        let path = CgroupPath::new("/sys/fs/cgroup", "workload.slice/job.service");
        assert_eq!(
            path.absolute_path(),
            PathBuf::from("/sys/fs/cgroup/workload.slice/job.service")
        );
        assert_eq!(path.to_string(), "/sys/fs/cgroup:/workload.slice/job.service");
    }

    #[test]
    fn test_parent_sorts_before_children() {
        let mut paths = vec![
            CgroupPath::new("/cg", "b/b1"),
            CgroupPath::new("/cg", "a/a1"),
            CgroupPath::new("/cg", "b"),
            CgroupPath::new("/cg", "a"),
        ];
        paths.sort();
        let rel: Vec<String> = paths.iter().map(CgroupPath::relative_path).collect();
        assert_eq!(rel, vec!["a", "a/a1", "b", "b/b1"]);
    }
}
