//! Pure progress projection for ring and stroke rendering.

/// Fraction of the phase already elapsed, in `[0, 1]`.
///
/// Defined as 0 for a zero total. `remaining` larger than `total` clamps to 0.
pub fn project(remaining: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let elapsed = total.saturating_sub(remaining);
    (elapsed as f64 / total as f64).clamp(0.0, 1.0)
}

/// Dash offset for an SVG outline of `path_length` that fills as `fraction` grows.
///
/// A full offset hides the stroke, zero shows all of it.
pub fn stroke_offset(fraction: f64, path_length: f64) -> f64 {
    path_length * (1.0 - fraction.clamp(0.0, 1.0))
}

/// `MM:SS`; minutes keep counting past 59.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
