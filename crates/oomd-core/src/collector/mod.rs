//! Sampling collaborator for the decision core.
//!
//! The core never reads kernel files itself: it asks a [`Sampler`] for
//! already-parsed numbers. [`CgroupSampler`] is the cgroup v2 implementation
//! and reads through the [`FileSystem`] trait, so tests run against
//! [`MockFs`] fixtures instead of a live `/sys/fs/cgroup`.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │              Oomd::update_context         │
//! └─────────────────────┬─────────────────────┘
//!                       │
//!                ┌──────▼──────┐
//!                │   Sampler   │ (trait)
//!                └──────┬──────┘
//!                       │
//!              ┌────────▼────────┐
//!              │  CgroupSampler  │  memory.current, memory.low,
//!              │                 │  memory.min, memory.pressure
//!              └────────┬────────┘
//!                       │
//!                ┌──────▼──────┐
//!                │  FileSystem │ (trait)
//!                └──────┬──────┘
//!              ┌────────┴────────┐
//!       ┌──────▼──────┐   ┌──────▼──────┐
//!       │   RealFs    │   │   MockFs    │
//!       └─────────────┘   └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use oomd_core::collector::{CgroupSampler, MockFs, Sampler};
//! use oomd_core::CgroupPath;
//!
//! let sampler = CgroupSampler::new(MockFs::system_hierarchy());
//! let path = CgroupPath::new(MockFs::CGROUP_ROOT, "system.slice/service2.service");
//! assert_eq!(sampler.read_usage(&path).unwrap(), 1 << 30);
//! ```

pub mod cgroup;
pub mod mock;
pub mod traits;

pub use cgroup::CgroupSampler;
pub use mock::MockFs;
pub use traits::{FileSystem, RealFs, Sampler};
