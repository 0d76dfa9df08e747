//! In-process cost store for tests and demos.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use cast_series::{CloudProvider, CostObservation};
use chrono::NaiveDate;
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::store::{merge_rows, select_window, CostStore, RecordKey, UpsertReport};

/// Cost store held in memory. Clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryCostStore {
    records: Arc<RwLock<BTreeMap<RecordKey, CostObservation>>>,
    unavailable: Arc<AtomicBool>,
    fetch_count: Arc<AtomicUsize>,
}

impl MemoryCostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with `rows`.
    pub fn with_rows(rows: Vec<CostObservation>) -> StoreResult<Self> {
        let store = Self::new();
        merge_rows(&mut store.records.write(), &rows)?;
        Ok(store)
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn simulate_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CostStore for MemoryCostStore {
    async fn fetch(
        &self,
        provider: CloudProvider,
        lookback_days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<CostObservation>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(select_window(&self.records.read(), provider, lookback_days, today))
    }

    async fn upsert(&self, rows: &[CostObservation]) -> StoreResult<UpsertReport> {
        self.check_available()?;
        merge_rows(&mut self.records.write(), rows)
    }

    fn describe(&self) -> String {
        format!("memory ({} rows)", self.len())
    }
}
