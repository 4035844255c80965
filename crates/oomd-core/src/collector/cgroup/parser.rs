//! Parsers for cgroup v2 memory files.

use crate::context::MemoryPressure;

/// Parses a single-value memory file (`memory.current`, `memory.low`,
/// `memory.min`).
/// Format: number (bytes) or "max"
pub fn parse_memory_value(content: &str) -> Option<i64> {
    let trimmed = content.trim();
    if trimmed == "max" {
        return Some(i64::MAX);
    }
    // The kernel reports u64; anything above i64::MAX is effectively "max".
    let value: u64 = trimmed.parse().ok()?;
    Some(i64::try_from(value).unwrap_or(i64::MAX))
}

/// Parses `memory.pressure`.
///
/// Format:
/// ```text
/// some avg10=0.00 avg60=0.00 avg300=0.00 total=0
/// full avg10=0.00 avg60=0.00 avg300=0.00 total=0
/// ```
/// Returns `None` if neither a `some` nor a `full` line is present.
pub fn parse_memory_pressure(content: &str) -> Option<MemoryPressure> {
    let mut pressure = MemoryPressure::default();
    let mut seen = false;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        let is_some = parts[0] == "some";
        let is_full = parts[0] == "full";
        if !is_some && !is_full {
            continue;
        }
        seen = true;

        for part in &parts[1..] {
            if let Some((key, value)) = part.split_once('=') {
                match (key, is_some) {
                    ("avg10", true) => pressure.some_avg10 = value.parse().unwrap_or(0.0),
                    ("avg60", true) => pressure.some_avg60 = value.parse().unwrap_or(0.0),
                    ("avg300", true) => pressure.some_avg300 = value.parse().unwrap_or(0.0),
                    ("total", true) => pressure.some_total = value.parse().unwrap_or(0),
                    ("avg10", false) => pressure.full_avg10 = value.parse().unwrap_or(0.0),
                    ("avg60", false) => pressure.full_avg60 = value.parse().unwrap_or(0.0),
                    ("avg300", false) => pressure.full_avg300 = value.parse().unwrap_or(0.0),
                    ("total", false) => pressure.full_total = value.parse().unwrap_or(0),
                    _ => {}
                }
            }
        }
    }

    seen.then_some(pressure)
}
