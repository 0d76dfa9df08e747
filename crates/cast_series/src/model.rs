//! Cost observation rows and the in-memory series derived from them.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::UNKNOWN;
use crate::provider::CloudProvider;

/// One day of spend for one service, as stored.
///
/// Rows are unique by `(date, provider, service)`. `cost` is in the row's
/// native `currency`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostObservation {
    pub date: NaiveDate,
    pub provider: CloudProvider,
    pub service: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    pub cost: f64,
}

impl CostObservation {
    pub fn new(
        date: NaiveDate,
        provider: CloudProvider,
        service: impl Into<String>,
        cost: f64,
    ) -> Self {
        Self {
            date,
            provider,
            service: service.into(),
            region: None,
            currency: None,
            cost,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Region, or the `unknown` sentinel when the row has none.
    pub fn region_or_unknown(&self) -> &str {
        self.region.as_deref().unwrap_or(UNKNOWN)
    }

    /// Currency, or the `unknown` sentinel when the row has none.
    pub fn currency_or_unknown(&self) -> &str {
        self.currency.as_deref().unwrap_or(UNKNOWN)
    }

    /// Cost as a float target; missing or non-finite amounts count as zero.
    pub fn cost_or_zero(&self) -> f64 {
        if self.cost.is_finite() {
            self.cost
        } else {
            0.0
        }
    }
}

/// Training-time grouping identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub provider: CloudProvider,
    pub service: String,
}

impl SeriesKey {
    pub fn new(provider: CloudProvider, service: impl Into<String>) -> Self {
        Self {
            provider,
            service: service.into(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.service)
    }
}

/// Summary-time grouping identity.
///
/// A service can bill under more than one region or currency, so summaries
/// split series one level finer than training does.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub provider: CloudProvider,
    pub service: String,
    pub region: String,
    pub currency: String,
}

impl GroupKey {
    pub fn new(
        provider: CloudProvider,
        service: impl Into<String>,
        region: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            service: service.into(),
            region: region.into(),
            currency: currency.into(),
        }
    }

    pub fn series_key(&self) -> SeriesKey {
        SeriesKey::new(self.provider, self.service.clone())
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.provider, self.service, self.region, self.currency
        )
    }
}

/// Where a series point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointOrigin {
    /// Read from storage
    Observed,
    /// Zero-cost day inserted by calendar repair
    Filled,
    /// Leading synthetic point added for training only
    Padded,
}

/// A dated point on the shared time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    /// Days since the minimum date of the batch the series was built in.
    pub time_idx: i64,
    pub cost: f64,
    pub region: String,
    pub currency: String,
    pub origin: PointOrigin,
}

/// An ordered daily series for one key, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub key: SeriesKey,
    pub points: Vec<SeriesPoint>,
}

impl TimeSeries {
    pub fn new(key: SeriesKey, points: Vec<SeriesPoint>) -> Self {
        Self { key, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cost values in date order.
    pub fn costs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.cost).collect()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn min_time_idx(&self) -> Option<i64> {
        self.points.iter().map(|p| p.time_idx).min()
    }

    pub fn max_time_idx(&self) -> Option<i64> {
        self.points.iter().map(|p| p.time_idx).max()
    }

    /// Number of points read from storage (excludes filled and padded days).
    pub fn observed_len(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.origin == PointOrigin::Observed)
            .count()
    }

    /// Whether `time_idx` values step by exactly one day from start to end.
    pub fn is_contiguous(&self) -> bool {
        self.points
            .windows(2)
            .all(|pair| pair[1].time_idx == pair[0].time_idx + 1)
    }

    /// Points with `time_idx <= cutoff`.
    pub fn truncated_at(&self, cutoff: i64) -> TimeSeries {
        TimeSeries {
            key: self.key.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.time_idx <= cutoff)
                .cloned()
                .collect(),
        }
    }
}

/// Earliest date across a set of rows.
pub fn min_date(rows: &[CostObservation]) -> Option<NaiveDate> {
    rows.iter().map(|r| r.date).min()
}

/// Recompute `time_idx` for every point as days since the earliest date
/// across all of `series`, so the set shares one time axis.
pub fn assign_time_index(series: &mut [TimeSeries]) {
    let origin = series
        .iter()
        .filter_map(|s| s.points.iter().map(|p| p.date).min())
        .min();

    if let Some(origin) = origin {
        for s in series.iter_mut() {
            for point in s.points.iter_mut() {
                point.time_idx = (point.date - origin).num_days();
            }
        }
    }
}

/// Group rows into one series per `(provider, service)`.
///
/// Series come back ordered by key, points ascending by date, with
/// `time_idx` measured from the earliest date in `rows`. Rows sharing a date
/// within one series are summed.
pub fn group_by_series_key(rows: &[CostObservation]) -> Vec<TimeSeries> {
    let mut grouped: BTreeMap<SeriesKey, Vec<&CostObservation>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(SeriesKey::new(row.provider, row.service.clone()))
            .or_default()
            .push(row);
    }

    let mut series: Vec<TimeSeries> = grouped
        .into_iter()
        .map(|(key, rows)| TimeSeries::new(key, collapse_days(&rows)))
        .collect();
    assign_time_index(&mut series);
    series
}

/// Group rows into one series per `(provider, service, region, currency)`.
pub fn group_by_group_key(rows: &[CostObservation]) -> Vec<(GroupKey, TimeSeries)> {
    let mut grouped: BTreeMap<GroupKey, Vec<&CostObservation>> = BTreeMap::new();
    for row in rows {
        let key = GroupKey::new(
            row.provider,
            row.service.clone(),
            row.region_or_unknown(),
            row.currency_or_unknown(),
        );
        grouped.entry(key).or_default().push(row);
    }

    let mut keys = Vec::with_capacity(grouped.len());
    let mut series = Vec::with_capacity(grouped.len());
    for (key, rows) in grouped {
        series.push(TimeSeries::new(key.series_key(), collapse_days(&rows)));
        keys.push(key);
    }
    assign_time_index(&mut series);
    keys.into_iter().zip(series).collect()
}

fn collapse_days(rows: &[&CostObservation]) -> Vec<SeriesPoint> {
    let mut by_date: BTreeMap<NaiveDate, SeriesPoint> = BTreeMap::new();
    for row in rows {
        by_date
            .entry(row.date)
            .and_modify(|p| p.cost += row.cost_or_zero())
            .or_insert_with(|| SeriesPoint {
                date: row.date,
                time_idx: 0,
                cost: row.cost_or_zero(),
                region: row.region_or_unknown().to_string(),
                currency: row.currency_or_unknown().to_string(),
                origin: PointOrigin::Observed,
            });
    }
    by_date.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_group_by_series_key_shares_time_axis() {
        let rows = vec![
            CostObservation::new(day(5), CloudProvider::Gcp, "compute", 3.0),
            CostObservation::new(day(2), CloudProvider::Gcp, "storage", 1.0),
            CostObservation::new(day(3), CloudProvider::Gcp, "compute", 2.0),
        ];

        let series = group_by_series_key(&rows);
        assert_eq!(series.len(), 2);

        let compute = &series[0];
        assert_eq!(compute.key.service, "compute");
        assert_eq!(compute.costs(), vec![2.0, 3.0]);
        assert_eq!(compute.points[0].time_idx, 1);
        assert_eq!(compute.points[1].time_idx, 3);

        let storage = &series[1];
        assert_eq!(storage.points[0].time_idx, 0);
    }

    #[test]
    fn test_missing_categoricals_become_unknown() {
        let rows = vec![CostObservation::new(day(1), CloudProvider::Azure, "vm", 1.0)];
        let series = group_by_series_key(&rows);
        assert_eq!(series[0].points[0].region, UNKNOWN);
        assert_eq!(series[0].points[0].currency, UNKNOWN);
    }

    #[test]
    fn test_same_day_rows_are_summed() {
        let rows = vec![
            CostObservation::new(day(1), CloudProvider::Gcp, "bq", 1.5),
            CostObservation::new(day(1), CloudProvider::Gcp, "bq", 2.5),
        ];
        let series = group_by_series_key(&rows);
        assert_eq!(series[0].costs(), vec![4.0]);
    }

    #[test]
    fn test_non_finite_cost_counts_as_zero() {
        let rows = vec![CostObservation::new(day(1), CloudProvider::Gcp, "bq", f64::NAN)];
        let series = group_by_series_key(&rows);
        assert_eq!(series[0].costs(), vec![0.0]);
    }

    #[test]
    fn test_group_by_group_key_splits_regions() {
        let rows = vec![
            CostObservation::new(day(1), CloudProvider::Gcp, "compute", 1.0)
                .with_region("us-central1")
                .with_currency("USD"),
            CostObservation::new(day(2), CloudProvider::Gcp, "compute", 2.0)
                .with_region("europe-west1")
                .with_currency("EUR"),
        ];

        let groups = group_by_group_key(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.region, "europe-west1");
        assert_eq!(groups[0].1.points[0].time_idx, 1);
        assert_eq!(groups[1].0.region, "us-central1");
        assert_eq!(groups[1].1.points[0].time_idx, 0);
    }

    #[test]
    fn test_observation_json_shape() {
        let json = r#"{"date":"2024-03-01","provider":"gcp","service":"bq","cost":2.0}"#;
        let row: CostObservation = serde_json::from_str(json).unwrap();
        assert_eq!(row.provider, CloudProvider::Gcp);
        assert!(row.region.is_none());
        assert_eq!(row.currency_or_unknown(), UNKNOWN);
    }

    #[test]
    fn test_truncated_at() {
        let rows: Vec<_> = (1..=5)
            .map(|d| CostObservation::new(day(d), CloudProvider::Gcp, "bq", d as f64))
            .collect();
        let series = &group_by_series_key(&rows)[0];
        let head = series.truncated_at(2);
        assert_eq!(head.costs(), vec![1.0, 2.0, 3.0]);
    }
}
