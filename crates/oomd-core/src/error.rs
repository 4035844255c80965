//! Error type for the decision core.

use crate::path::CgroupPath;

/// Errors surfaced to the driver.
///
/// Per-cgroup read failures are absorbed by the update protocol and never
/// show up here; everything below aborts the current tick.
#[derive(Debug)]
pub enum CoreError {
    /// The configured hierarchy root does not exist or cannot be listed.
    HierarchyUnavailable { root: String },
    /// A cgroup was handed to the overage pass without its parent.
    BrokenHierarchy { path: CgroupPath },
    /// A path segment is not a valid glob.
    InvalidPattern { pattern: String, reason: String },
    /// No context is stored for the cgroup.
    NotFound(CgroupPath),
    /// Driver configuration rejected at construction.
    InvalidConfig(String),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::HierarchyUnavailable { root } => {
                write!(f, "cgroup hierarchy unavailable at {}", root)
            }
            CoreError::BrokenHierarchy { path } => {
                write!(f, "broken hierarchy: {} has no parent context", path)
            }
            CoreError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid cgroup pattern '{}': {}", pattern, reason)
            }
            CoreError::NotFound(path) => write!(f, "no context for {}", path),
            CoreError::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}
