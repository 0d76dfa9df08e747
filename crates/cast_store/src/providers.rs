//! Per-provider store lookup.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use cast_series::CloudProvider;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::file::FileCostStore;
use crate::store::CostStore;

/// Explicit mapping from provider to its cost store.
///
/// A provider without an entry has no storage connection; asking for it is a
/// configuration error scoped to that provider.
#[derive(Clone, Default)]
pub struct ProviderStores {
    stores: BTreeMap<CloudProvider, Arc<dyn CostStore>>,
}

impl ProviderStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`FileCostStore`] per configured path.
    pub fn from_paths(paths: &BTreeMap<CloudProvider, PathBuf>) -> Self {
        paths.iter().fold(Self::new(), |stores, (provider, path)| {
            stores.with_store(*provider, Arc::new(FileCostStore::new(path)))
        })
    }

    pub fn with_store(mut self, provider: CloudProvider, store: Arc<dyn CostStore>) -> Self {
        self.insert(provider, store);
        self
    }

    pub fn insert(&mut self, provider: CloudProvider, store: Arc<dyn CostStore>) {
        debug!("[{}] Using cost store {}", provider.tag(), store.describe());
        self.stores.insert(provider, store);
    }

    pub fn get(&self, provider: CloudProvider) -> StoreResult<Arc<dyn CostStore>> {
        self.stores
            .get(&provider)
            .cloned()
            .ok_or(StoreError::NotConfigured(provider))
    }

    pub fn is_configured(&self, provider: CloudProvider) -> bool {
        self.stores.contains_key(&provider)
    }

    /// Providers with a store, in order.
    pub fn providers(&self) -> Vec<CloudProvider> {
        self.stores.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

impl std::fmt::Debug for ProviderStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.stores.iter().map(|(p, s)| (p, s.describe())))
            .finish()
    }
}
