//! Context store: resolved cgroup path to per-cgroup state.
//!
//! The store is filled by [`Oomd::update_context`](crate::Oomd::update_context)
//! and read by the policy layer. Entries are never removed implicitly; a
//! cgroup that disappears keeps its last state until the driver calls
//! [`OomdContext::remove_cgroup`].

mod cgroup_context;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;

use crate::error::CoreError;
use crate::fmt::{FmtStyle, format_bytes};
use crate::path::CgroupPath;

pub use cgroup_context::{CgroupContext, MemoryPressure, smooth_average};

/// Map from resolved cgroup path to its context.
///
/// Iteration is ordered by path, parents before children.
#[derive(Debug, Default, Clone)]
pub struct OomdContext {
    cgroups: BTreeMap<CgroupPath, CgroupContext>,
}

#[derive(Serialize)]
struct DumpEntry<'a> {
    path: String,
    #[serde(flatten)]
    context: &'a CgroupContext,
}

impl OomdContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_cgroup_context(&self, path: &CgroupPath) -> bool {
        self.cgroups.contains_key(path)
    }

    pub fn get_cgroup_context(&self, path: &CgroupPath) -> Result<&CgroupContext, CoreError> {
        self.cgroups
            .get(path)
            .ok_or_else(|| CoreError::NotFound(path.clone()))
    }

    /// All stored cgroups, including synthesized ancestors.
    pub fn cgroups(&self) -> impl Iterator<Item = (&CgroupPath, &CgroupContext)> {
        self.cgroups.iter()
    }

    /// Stored cgroups that matched a requested pattern on their last update.
    pub fn monitored_cgroups(&self) -> impl Iterator<Item = (&CgroupPath, &CgroupContext)> {
        self.cgroups.iter().filter(|(_, ctx)| !ctx.synthesized)
    }

    pub fn len(&self) -> usize {
        self.cgroups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cgroups.is_empty()
    }

    /// Drops a cgroup, e.g. after the driver saw it vanish for good.
    pub fn remove_cgroup(&mut self, path: &CgroupPath) -> Option<CgroupContext> {
        self.cgroups.remove(path)
    }

    /// Monitored cgroups ranked as kill candidates.
    ///
    /// Highest protection overage first; ties go to the larger current
    /// usage, then to path order.
    pub fn kill_candidates(&self) -> Vec<(&CgroupPath, &CgroupContext)> {
        let mut candidates: Vec<_> = self.monitored_cgroups().collect();
        candidates.sort_by(|(a_path, a), (b_path, b)| {
            b.protection_overage
                .cmp(&a.protection_overage)
                .then(b.current_usage.cmp(&a.current_usage))
                .then(a_path.cmp(b_path))
        });
        candidates
    }

    /// Human-readable snapshot of the whole store, one line per cgroup.
    ///
    /// For debugging only, not a stable format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<56} {:>8} {:>8} {:>8} {:>8} {:>8}",
            "CGROUP", "USAGE", "AVG", "PROT", "EPROT", "OVERAGE"
        );
        for (path, ctx) in &self.cgroups {
            let _ = write!(
                out,
                "{:<56} {:>8} {:>8} {:>8} {:>8} {:>8}",
                path.to_string(),
                format_bytes(ctx.current_usage, FmtStyle::Compact),
                format_bytes(ctx.average_usage, FmtStyle::Compact),
                format_bytes(ctx.protection_limit, FmtStyle::Compact),
                format_bytes(ctx.effective_protection, FmtStyle::Compact),
                format_bytes(ctx.protection_overage, FmtStyle::Compact),
            );
            if let Some(pressure) = &ctx.pressure {
                let _ = write!(
                    out,
                    " psi={:.2}/{:.2}/{:.2}",
                    pressure.some_avg10, pressure.some_avg60, pressure.some_avg300
                );
            }
            if ctx.synthesized {
                out.push_str(" (ancestor)");
            }
            out.push('\n');
        }
        out
    }

    /// JSON snapshot of the whole store.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let entries: Vec<DumpEntry<'_>> = self
            .cgroups
            .iter()
            .map(|(path, context)| DumpEntry {
                path: path.to_string(),
                context,
            })
            .collect();
        serde_json::to_string_pretty(&entries)
    }

    /// Replaces the entries of every staged cgroup in one step.
    pub(crate) fn commit(&mut self, staged: BTreeMap<CgroupPath, CgroupContext>) {
        self.cgroups.extend(staged);
    }
}
