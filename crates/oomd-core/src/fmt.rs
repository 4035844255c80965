//! Shared formatting helpers for logs and diagnostic dumps.

/// Controls compact (dump columns) vs verbose (log lines) output.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FmtStyle {
    /// Compact: no spaces, short suffixes ("1.5G")
    Compact,
    /// Detail: spaces, full suffixes ("1.5 GiB")
    Detail,
}

/// Format byte count as human-readable size.
///
/// Compact: `"1.5G"`, `"100.3M"`, `"50.0K"`, `"512B"`
/// Detail:  `"1.5 GiB"`, `"100.3 MiB"`, `"50.0 KiB"`, `"512 B"`
///
/// `i64::MAX` (an unlimited `memory.low`) renders as `"max"`.
pub fn format_bytes(bytes: i64, style: FmtStyle) -> String {
    if bytes == i64::MAX {
        return "max".to_string();
    }
    let (g, m, k, b) = match style {
        FmtStyle::Compact => ("G", "M", "K", "B"),
        FmtStyle::Detail => (" GiB", " MiB", " KiB", " B"),
    };
    let sign = if bytes < 0 { "-" } else { "" };
    let abs = bytes.unsigned_abs();
    let f = abs as f64;
    if abs >= 1024 * 1024 * 1024 {
        format!("{}{:.1}{}", sign, f / (1024.0 * 1024.0 * 1024.0), g)
    } else if abs >= 1024 * 1024 {
        format!("{}{:.1}{}", sign, f / (1024.0 * 1024.0), m)
    } else if abs >= 1024 {
        format!("{}{:.1}{}", sign, f / 1024.0, k)
    } else {
        format!("{}{}{}", sign, abs, b)
    }
}
