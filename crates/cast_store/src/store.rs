//! The cost store capability and helpers shared by implementations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cast_series::{CloudProvider, CostObservation};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Storage identity of a row, ordered so that iteration yields rows by
/// provider, then service, then date.
pub type RecordKey = (CloudProvider, String, NaiveDate);

pub fn record_key(row: &CostObservation) -> RecordKey {
    (row.provider, row.service.clone(), row.date)
}

/// Counts from one upsert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReport {
    pub inserted: usize,
    pub updated: usize,
}

impl UpsertReport {
    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Daily cost rows for one or more providers.
#[async_trait]
pub trait CostStore: Send + Sync {
    /// Rows for `provider` dated on or after `today - lookback_days`,
    /// ordered by service then date.
    async fn fetch(
        &self,
        provider: CloudProvider,
        lookback_days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<CostObservation>>;

    /// Insert rows, replacing any stored row with the same
    /// `(date, provider, service)`.
    async fn upsert(&self, rows: &[CostObservation]) -> StoreResult<UpsertReport>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// First date inside a lookback window ending `today`.
pub fn window_start(today: NaiveDate, lookback_days: u32) -> NaiveDate {
    today - Duration::days(i64::from(lookback_days))
}

/// Rows of `provider` inside the lookback window, in key order.
pub(crate) fn select_window(
    records: &BTreeMap<RecordKey, CostObservation>,
    provider: CloudProvider,
    lookback_days: u32,
    today: NaiveDate,
) -> Vec<CostObservation> {
    let start = window_start(today, lookback_days);
    records
        .iter()
        .filter(|((p, _, date), _)| *p == provider && *date >= start)
        .map(|(_, row)| row.clone())
        .collect()
}

/// Merge `rows` into `records`, counting inserts and replacements.
pub(crate) fn merge_rows(
    records: &mut BTreeMap<RecordKey, CostObservation>,
    rows: &[CostObservation],
) -> StoreResult<UpsertReport> {
    for row in rows {
        validate_row(row)?;
    }

    let mut report = UpsertReport::default();
    for row in rows {
        match records.insert(record_key(row), row.clone()) {
            Some(_) => report.updated += 1,
            None => report.inserted += 1,
        }
    }
    Ok(report)
}

fn validate_row(row: &CostObservation) -> StoreResult<()> {
    if row.service.trim().is_empty() {
        return Err(StoreError::InvalidRecord(format!(
            "{} row on {} has an empty service",
            row.provider, row.date
        )));
    }
    if !row.cost.is_finite() || row.cost < 0.0 {
        return Err(StoreError::InvalidRecord(format!(
            "{}/{} on {} has cost {}",
            row.provider, row.service, row.date, row.cost
        )));
    }
    Ok(())
}
