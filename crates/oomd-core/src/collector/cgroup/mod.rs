//! Cgroup v2 memory sampling.
//!
//! Reads usage, protection and pressure for individual cgroups from the
//! cgroup v2 filesystem.

mod parser;
mod sampler;

pub use sampler::CgroupSampler;
