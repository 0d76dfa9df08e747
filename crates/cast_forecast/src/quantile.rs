//! Choosing which forecaster output row to report.

/// The point estimate reported by summaries.
pub const MEDIAN: f64 = 0.5;

const LEVEL_TOLERANCE: f64 = 1e-9;

/// Index of the output row for `desired` within ascending `levels`.
///
/// An exact level match wins. Otherwise the middle row (`len / 2`, the upper
/// median for even lengths) is used. With no configured levels the
/// forecaster has a single output row, index 0.
pub fn select_quantile_index(levels: &[f64], desired: f64) -> usize {
    if levels.is_empty() {
        return 0;
    }
    levels
        .iter()
        .position(|level| (level - desired).abs() < LEVEL_TOLERANCE)
        .unwrap_or(levels.len() / 2)
}

/// Index of the median row.
pub fn median_index(levels: &[f64]) -> usize {
    select_quantile_index(levels, MEDIAN)
}

/// Display label for a quantile level: `0.5` → `"0.5"`.
pub fn quantile_label(level: f64) -> String {
    format!("{}", level)
}
