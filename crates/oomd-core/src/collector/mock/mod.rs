//! Mock filesystem implementations for testing.
//!
//! This module provides `MockFs` and pre-built cgroup hierarchies for testing
//! the sampler and the update protocol without a real cgroup2 mount.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
