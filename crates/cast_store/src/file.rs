//! JSON-lines file store.
//!
//! One `CostObservation` per line:
//! ```text
//! {"date":"2024-06-01","provider":"gcp","service":"BigQuery","region":"US","currency":"INR","cost":412.5}
//! ```
//! Upserts rewrite the whole file through a sibling temporary file, so a
//! reader never observes a half-written store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cast_series::{CloudProvider, CostObservation};
use chrono::NaiveDate;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::store::{merge_rows, record_key, select_window, CostStore, RecordKey, UpsertReport};

/// Cost store backed by a JSON-lines file.
#[derive(Debug)]
pub struct FileCostStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCostStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored row, keyed by storage identity.
    ///
    /// A missing file is an empty store.
    async fn load(&self) -> StoreResult<BTreeMap<RecordKey, CostObservation>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Store {:?} does not exist yet; treating as empty", self.path);
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read {:?}: {}",
                    self.path, e
                )))
            }
        };
        parse_lines(&content)
    }

    async fn persist(&self, records: &BTreeMap<RecordKey, CostObservation>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut content = String::new();
        for row in records.values() {
            content.push_str(&serde_json::to_string(row)?);
            content.push('\n');
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Parse JSON-lines content, skipping blank lines.
///
/// Later lines win over earlier ones with the same storage identity.
pub fn parse_lines(content: &str) -> StoreResult<BTreeMap<RecordKey, CostObservation>> {
    let mut records = BTreeMap::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: CostObservation = serde_json::from_str(line).map_err(|e| StoreError::Corrupt {
            line: index + 1,
            message: e.to_string(),
        })?;
        records.insert(record_key(&row), row);
    }
    Ok(records)
}

#[async_trait]
impl CostStore for FileCostStore {
    async fn fetch(
        &self,
        provider: CloudProvider,
        lookback_days: u32,
        today: NaiveDate,
    ) -> StoreResult<Vec<CostObservation>> {
        let records = self.load().await?;
        let rows = select_window(&records, provider, lookback_days, today);
        debug!(
            "[{}] Fetched {} row(s) from {:?} (lookback {} days)",
            provider.tag(),
            rows.len(),
            self.path,
            lookback_days
        );
        Ok(rows)
    }

    async fn upsert(&self, rows: &[CostObservation]) -> StoreResult<UpsertReport> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;
        let report = merge_rows(&mut records, rows)?;
        self.persist(&records).await?;
        info!(
            "Upserted {} row(s) into {:?} ({} new, {} replaced)",
            report.total(),
            self.path,
            report.inserted,
            report.updated
        );
        Ok(report)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
