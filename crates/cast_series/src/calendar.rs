//! Calendar repair for daily cost series.
//!
//! Billing exports skip days with no usage. The forecasters expect one point
//! per day, so missing dates are inserted as zero-cost days.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::debug;

use crate::model::{assign_time_index, PointOrigin, SeriesPoint, TimeSeries};

/// Sentinel for a categorical value that could not be resolved.
pub const UNKNOWN: &str = "unknown";

/// Produce gap-free daily series covering each input series' first to last
/// date, inclusive.
///
/// Inserted days cost `0.0` and take their region/currency from the nearest
/// earlier point, then the nearest later point, then [`UNKNOWN`]. `time_idx`
/// is recomputed across all returned series from their common earliest date.
pub fn normalize_calendar(series: Vec<TimeSeries>) -> Vec<TimeSeries> {
    let mut normalized: Vec<TimeSeries> = series.into_iter().map(fill_series).collect();
    assign_time_index(&mut normalized);
    normalized
}

fn fill_series(series: TimeSeries) -> TimeSeries {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return series,
    };

    let TimeSeries { key, points } = series;
    let known: BTreeMap<NaiveDate, SeriesPoint> =
        points.into_iter().map(|p| (p.date, p)).collect();

    let span = (last - first).num_days().max(0) as usize + 1;
    let dates: Vec<NaiveDate> = (0..span)
        .map(|offset| first + Duration::days(offset as i64))
        .collect();

    let regions: Vec<Option<String>> = dates
        .iter()
        .map(|d| known.get(d).map(|p| p.region.clone()))
        .collect();
    let currencies: Vec<Option<String>> = dates
        .iter()
        .map(|d| known.get(d).map(|p| p.currency.clone()))
        .collect();
    let regions = fill_categorical(&regions);
    let currencies = fill_categorical(&currencies);

    let filled = span - known.len();
    if filled > 0 {
        debug!("Filling {} missing day(s) for {}", filled, key);
    }

    let points = dates
        .into_iter()
        .zip(regions.into_iter().zip(currencies))
        .map(|(date, (region, currency))| match known.get(&date) {
            Some(point) => point.clone(),
            None => SeriesPoint {
                date,
                time_idx: 0,
                cost: 0.0,
                region,
                currency,
                origin: PointOrigin::Filled,
            },
        })
        .collect();

    TimeSeries { key, points }
}

/// Forward-fill, then back-fill, then default to [`UNKNOWN`].
pub fn fill_categorical(values: &[Option<String>]) -> Vec<String> {
    let mut forward: Vec<Option<String>> = Vec::with_capacity(values.len());
    let mut last_seen: Option<&String> = None;
    for value in values {
        if let Some(v) = value {
            last_seen = Some(v);
        }
        forward.push(last_seen.cloned());
    }

    let mut next_seen: Option<String> = None;
    for slot in forward.iter_mut().rev() {
        match slot {
            Some(v) => next_seen = Some(v.clone()),
            None => *slot = next_seen.clone(),
        }
    }

    forward
        .into_iter()
        .map(|v| v.unwrap_or_else(|| UNKNOWN.to_string()))
        .collect()
}
