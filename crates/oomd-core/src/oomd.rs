//! Per-tick update protocol.
//!
//! [`Oomd::update_context`] is called once per polling interval. It resolves
//! the requested patterns, samples every resolved cgroup, advances the
//! smoothed averages, recomputes protection overage for the whole tree and
//! only then writes the results into the store.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use tracing::{debug, trace, warn};

use crate::collector::Sampler;
use crate::context::{CgroupContext, OomdContext, smooth_average};
use crate::error::CoreError;
use crate::overage::{CgroupTree, MemorySample};
use crate::path::CgroupPath;
use crate::resolver;

/// How the average of a newly observed cgroup is initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AverageSeed {
    /// Start at 0 and converge through smoothing.
    #[default]
    Zero,
    /// Start at the first sample.
    FirstSample,
}

/// Counters from one `update_context` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Cgroups resolved, ancestors included.
    pub resolved: usize,
    /// Cgroups sampled successfully.
    pub sampled: usize,
    /// Cgroups whose read failed this tick.
    pub skipped: usize,
    /// Cgroups scored as top-level because their parent has no sample.
    pub orphaned: usize,
}

/// Drives context updates against a sampler.
pub struct Oomd<S: Sampler> {
    sampler: S,
    average_decay: f64,
    average_seed: AverageSeed,
}

impl<S: Sampler> Oomd<S> {
    /// Smoothing factor applied per tick; close to 1 so averages move slowly.
    pub const DEFAULT_AVERAGE_DECAY: f64 = 0.99;

    pub fn new(sampler: S) -> Self {
        Self {
            sampler,
            average_decay: Self::DEFAULT_AVERAGE_DECAY,
            average_seed: AverageSeed::default(),
        }
    }

    /// Overrides the smoothing factor. Must lie strictly between 0 and 1.
    pub fn with_average_decay(mut self, decay: f64) -> Result<Self, CoreError> {
        if !(decay > 0.0 && decay < 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "average decay must be in (0, 1), got {}",
                decay
            )));
        }
        self.average_decay = decay;
        Ok(self)
    }

    pub fn with_average_seed(mut self, seed: AverageSeed) -> Self {
        self.average_seed = seed;
        self
    }

    pub fn average_decay(&self) -> f64 {
        self.average_decay
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    /// Refreshes `ctx` for every cgroup matched by `requested`.
    ///
    /// Cgroups that cannot be read this tick keep their previous context.
    /// On error nothing in `ctx` is modified.
    pub fn update_context(
        &self,
        requested: &HashSet<CgroupPath>,
        ctx: &mut OomdContext,
    ) -> Result<UpdateStats, CoreError> {
        let resolved = resolver::resolve(&self.sampler, requested)?;
        let now = Utc::now().timestamp();

        let mut stats = UpdateStats {
            resolved: resolved.len(),
            ..Default::default()
        };
        let mut staged: BTreeMap<CgroupPath, CgroupContext> = BTreeMap::new();

        for path in resolved.iter() {
            let previous = ctx.get_cgroup_context(path).ok();
            match self.sample(path) {
                Ok((usage, limit)) => {
                    let mut next = previous.cloned().unwrap_or_default();
                    next.average_usage = match (previous, self.average_seed) {
                        (None, AverageSeed::FirstSample) => usage,
                        _ => smooth_average(next.average_usage, usage, self.average_decay),
                    };
                    next.current_usage = usage;
                    next.protection_limit = limit;
                    next.pressure = self.sampler.read_pressure(path).ok();
                    next.sampled_at = now;
                    next.synthesized = resolved.is_synthesized(path);
                    trace!(
                        "{}: usage={} avg={} limit={}",
                        path, usage, next.average_usage, limit
                    );
                    staged.insert(path.clone(), next);
                    stats.sampled += 1;
                }
                Err(e) => {
                    debug!("Skipping {} this tick: {}", path, e);
                    stats.skipped += 1;
                    if let Some(previous) = previous {
                        staged.insert(path.clone(), previous.clone());
                    }
                }
            }
        }

        let samples: BTreeMap<CgroupPath, MemorySample> = staged
            .iter()
            .map(|(path, context)| {
                let sample = MemorySample::new(context.current_usage, context.protection_limit);
                (path.clone(), sample)
            })
            .collect();

        // An ancestor that failed its first read leaves its subtree without
        // a parent budget; score that subtree as if it hung off the root.
        let tree = CgroupTree::build_detached(&samples);
        for orphan in tree.orphans() {
            warn!("{} has no sampled parent, scored as top-level", orphan);
        }
        stats.orphaned = tree.orphans().len();

        for (path, result) in tree.protection() {
            if let Some(context) = staged.get_mut(&path) {
                context.effective_protection = result.effective;
                context.protection_overage = result.overage;
            }
        }

        ctx.commit(staged);
        debug!(
            "Context updated: {} resolved, {} sampled, {} skipped, {} orphaned",
            stats.resolved, stats.sampled, stats.skipped, stats.orphaned
        );
        Ok(stats)
    }

    fn sample(&self, path: &CgroupPath) -> std::io::Result<(i64, i64)> {
        let usage = self.sampler.read_usage(path)?;
        let limit = self.sampler.read_protection_limit(path)?;
        Ok((usage, limit))
    }
}
