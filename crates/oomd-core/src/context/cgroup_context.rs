//! Per-cgroup state kept between ticks.

use serde::{Deserialize, Serialize};

/// Memory pressure stall information.
///
/// Source file:
/// - `memory.pressure` - `some`/`full` stall averages and totals
///
/// Opaque to the core; carried for the policy layer.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct MemoryPressure {
    /// Share of time at least one task stalled on memory, 10s window (%).
    pub some_avg10: f64,
    pub some_avg60: f64,
    pub some_avg300: f64,
    /// Total stall time in microseconds.
    pub some_total: u64,
    /// Share of time all tasks stalled on memory, 10s window (%).
    pub full_avg10: f64,
    pub full_avg60: f64,
    pub full_avg300: f64,
    pub full_total: u64,
}

/// State of one cgroup as of its last successful sample.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CgroupContext {
    /// Instantaneous usage in bytes (`memory.current`).
    pub current_usage: i64,
    /// Exponentially smoothed usage in bytes. Starts at 0.
    pub average_usage: i64,
    /// Configured protection in bytes, `max(memory.low, memory.min)`.
    pub protection_limit: i64,
    /// Protection left for this cgroup after hierarchical distribution.
    pub effective_protection: i64,
    /// Usage above `effective_protection`, never negative.
    pub protection_overage: i64,
    /// Last pressure sample, if the sampler provides one.
    pub pressure: Option<MemoryPressure>,
    /// Unix timestamp (seconds) of the last successful sample.
    pub sampled_at: i64,
    /// Present only as an ancestor of a requested cgroup.
    pub synthesized: bool,
}

/// One step of exponential smoothing.
///
/// Moves `average` toward `current` by `1 - decay` of the gap, rounded away
/// from `average` to whole bytes. Every step covers at least one byte and
/// never passes `current`.
pub fn smooth_average(average: i64, current: i64, decay: f64) -> i64 {
    let target = average as f64 * decay + current as f64 * (1.0 - decay);
    if current > average {
        (target.ceil() as i64).clamp(average.saturating_add(1), current)
    } else if current < average {
        (target.floor() as i64).clamp(current, average.saturating_sub(1))
    } else {
        current
    }
}
