//! Leading padding for series too short to cut into training windows.
//!
//! Padded points carry [`PointOrigin::Padded`] and exist only for training.
//! Nothing reported back as observed spend is ever built from them.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{PointOrigin, SeriesPoint, TimeSeries};

/// Minimum number of points a series needs before window refinement.
pub const DEFAULT_MIN_POINTS: usize = 2;

/// Cost assigned to synthetic leading points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadPolicy {
    /// Repeat the earliest observed cost backward
    #[default]
    RepeatEarliest,
    /// Use zero-cost synthetic days
    Zero,
}

/// Prepend synthetic points to every series shorter than `min_points`.
///
/// Each synthetic point clones the earliest point's categoricals and sits one
/// day (and one `time_idx`) before the previous one. Empty series are left
/// alone since there is nothing to extrapolate from.
pub fn pad_short_series(
    series: Vec<TimeSeries>,
    min_points: usize,
    policy: PadPolicy,
) -> Vec<TimeSeries> {
    series
        .into_iter()
        .map(|s| pad_one(s, min_points, policy))
        .collect()
}

fn pad_one(series: TimeSeries, min_points: usize, policy: PadPolicy) -> TimeSeries {
    if series.len() >= min_points {
        return series;
    }
    let earliest = match series.first() {
        Some(p) => p.clone(),
        None => return series,
    };

    let needed = min_points - series.len();
    debug!("Padding {} with {} leading point(s)", series.key, needed);

    let cost = match policy {
        PadPolicy::RepeatEarliest => earliest.cost,
        PadPolicy::Zero => 0.0,
    };

    let mut points: Vec<SeriesPoint> = (1..=needed as i64)
        .rev()
        .map(|offset| SeriesPoint {
            date: earliest.date - Duration::days(offset),
            time_idx: earliest.time_idx - offset,
            cost,
            region: earliest.region.clone(),
            currency: earliest.currency.clone(),
            origin: PointOrigin::Padded,
        })
        .collect();
    points.extend(series.points);

    TimeSeries {
        key: series.key,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{group_by_series_key, CostObservation};
    use crate::provider::CloudProvider;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn test_pads_single_point_series() {
        let rows = vec![
            CostObservation::new(day(10), CloudProvider::Gcp, "dns", 3.5).with_region("global"),
            CostObservation::new(day(5), CloudProvider::Gcp, "gke", 1.0),
        ];
        let padded = pad_short_series(group_by_series_key(&rows), 3, PadPolicy::RepeatEarliest);

        let dns = &padded[0];
        assert_eq!(dns.len(), 3);
        assert_eq!(dns.costs(), vec![3.5, 3.5, 3.5]);
        assert_eq!(dns.points[0].date, day(8));
        assert_eq!(dns.points[1].date, day(9));
        assert_eq!(dns.points[0].time_idx, 3);
        assert_eq!(dns.points[1].time_idx, 4);
        assert_eq!(dns.points[2].time_idx, 5);
        assert_eq!(dns.points[0].region, "global");
        assert_eq!(dns.points[0].origin, PointOrigin::Padded);
        assert_eq!(dns.points[2].origin, PointOrigin::Observed);
        assert!(dns.is_contiguous());
    }

    #[test]
    fn test_long_enough_series_untouched() {
        let rows = vec![
            CostObservation::new(day(1), CloudProvider::Gcp, "gke", 1.0),
            CostObservation::new(day(2), CloudProvider::Gcp, "gke", 2.0),
        ];
        let before = group_by_series_key(&rows);
        let after = pad_short_series(before.clone(), DEFAULT_MIN_POINTS, PadPolicy::default());
        assert_eq!(before, after);
    }

    #[test]
    fn test_zero_policy() {
        let rows = vec![CostObservation::new(day(3), CloudProvider::Aws, "s3", 9.0)];
        let padded = pad_short_series(group_by_series_key(&rows), 2, PadPolicy::Zero);
        assert_eq!(padded[0].costs(), vec![0.0, 9.0]);
        assert_eq!(padded[0].points[0].time_idx, -1);
    }
}
