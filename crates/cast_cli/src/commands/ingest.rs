//! Ingest command - Upsert daily cost rows.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cast_series::{CloudProvider, CostObservation};
use cast_service::CloudcastConfig;
use cast_store::{parse_lines, FileCostStore, ProviderStores, UpsertReport};

use super::parse_provider;

#[derive(Args)]
pub struct IngestArgs {
    /// JSON-lines file, one cost row per line
    #[arg(short, long)]
    file: PathBuf,

    /// Only ingest rows of this provider
    #[arg(short, long, value_parser = parse_provider)]
    provider: Option<CloudProvider>,

    /// Store path to use for --provider instead of the configured one
    #[arg(long, requires = "provider")]
    store: Option<PathBuf>,
}

pub async fn execute(args: IngestArgs) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {:?}", args.file))?;
    let rows = parse_lines(&content).with_context(|| format!("Invalid cost rows in {:?}", args.file))?;

    let config = CloudcastConfig::from_env();
    let mut stores = ProviderStores::from_paths(&config.store_paths);
    if let (Some(provider), Some(path)) = (args.provider, &args.store) {
        stores.insert(provider, Arc::new(FileCostStore::new(path)));
    }

    let reports = ingest_rows(&stores, rows.into_values(), args.provider).await?;
    for (provider, report) in reports {
        println!(
            "✅ {}: {} inserted, {} updated",
            provider, report.inserted, report.updated
        );
    }
    Ok(())
}

/// Upsert `rows` into their providers' stores, optionally keeping only one provider.
pub async fn ingest_rows(
    stores: &ProviderStores,
    rows: impl IntoIterator<Item = CostObservation>,
    only: Option<CloudProvider>,
) -> Result<Vec<(CloudProvider, UpsertReport)>> {
    let mut by_provider: BTreeMap<CloudProvider, Vec<CostObservation>> = BTreeMap::new();
    for row in rows {
        if only.map_or(true, |p| p == row.provider) {
            by_provider.entry(row.provider).or_default().push(row);
        }
    }
    if by_provider.is_empty() {
        anyhow::bail!("No cost rows to ingest");
    }

    let mut reports = Vec::with_capacity(by_provider.len());
    for (provider, rows) in by_provider {
        let store = stores.get(provider)?;
        let report = store
            .upsert(&rows)
            .await
            .with_context(|| format!("Failed to upsert {} row(s) into {}", rows.len(), store.describe()))?;
        info!(
            "[{}] Upserted {} row(s) into {}",
            provider.tag(),
            report.total(),
            store.describe()
        );
        reports.push((provider, report));
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cast_store::{MemoryCostStore, StoreError};
    use chrono::NaiveDate;

    fn row(provider: CloudProvider, day: u32, cost: f64) -> CostObservation {
        CostObservation::new(NaiveDate::from_ymd_opt(2024, 5, day).unwrap(), provider, "storage", cost)
    }

    #[tokio::test]
    async fn test_ingest_splits_by_provider() {
        let gcp = Arc::new(MemoryCostStore::new());
        let aws = Arc::new(MemoryCostStore::new());
        let stores = ProviderStores::new()
            .with_store(CloudProvider::Gcp, gcp.clone())
            .with_store(CloudProvider::Aws, aws.clone());

        let rows = vec![
            row(CloudProvider::Gcp, 1, 1.0),
            row(CloudProvider::Gcp, 2, 2.0),
            row(CloudProvider::Aws, 1, 3.0),
        ];
        let reports = ingest_rows(&stores, rows, None).await.unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(gcp.len(), 2);
        assert_eq!(aws.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_filter_and_missing_store() {
        let gcp = Arc::new(MemoryCostStore::new());
        let stores = ProviderStores::new().with_store(CloudProvider::Gcp, gcp.clone());

        let rows = vec![row(CloudProvider::Gcp, 1, 1.0), row(CloudProvider::Azure, 1, 5.0)];
        ingest_rows(&stores, rows.clone(), Some(CloudProvider::Gcp))
            .await
            .unwrap();
        assert_eq!(gcp.len(), 1);

        let err = ingest_rows(&stores, rows, None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotConfigured(CloudProvider::Azure))
        ));
    }

    #[tokio::test]
    async fn test_ingest_nothing_is_an_error() {
        let stores = ProviderStores::new();
        assert!(ingest_rows(&stores, Vec::new(), None).await.is_err());
    }
}
