//! Registry of loaded forecasters, one per provider.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cast_series::CloudProvider;
use tracing::{debug, info};

use crate::baseline::BaselineForecaster;
use crate::error::{ForecastError, ForecastResult};
use crate::forecaster::Forecaster;

/// Directory name holding the fallback model.
pub const DEFAULT_MODEL_KEY: &str = "default";

/// File name of a model artifact within its provider directory.
pub const MODEL_FILE_NAME: &str = "model.json";

/// Path of the artifact for `key` under `model_dir`.
pub fn artifact_path(model_dir: impl AsRef<Path>, key: &str) -> PathBuf {
    model_dir.as_ref().join(key).join(MODEL_FILE_NAME)
}

/// Collects forecasters before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    forecasters: BTreeMap<CloudProvider, Arc<dyn Forecaster>>,
    default: Option<Arc<dyn Forecaster>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider's forecaster, replacing any earlier one.
    pub fn register(mut self, provider: CloudProvider, forecaster: Arc<dyn Forecaster>) -> Self {
        debug!("Registering {} forecaster for {}", forecaster.name(), provider);
        self.forecasters.insert(provider, forecaster);
        self
    }

    /// Register the forecaster used for providers without their own.
    pub fn with_default(mut self, forecaster: Arc<dyn Forecaster>) -> Self {
        debug!("Registering default {} forecaster", forecaster.name());
        self.default = Some(forecaster);
        self
    }

    pub fn build(self) -> ForecasterRegistry {
        ForecasterRegistry {
            forecasters: self.forecasters,
            default: self.default,
        }
    }
}

/// Provider-to-forecaster mapping, fixed once built.
///
/// Built at startup and shared read-only across requests.
pub struct ForecasterRegistry {
    forecasters: BTreeMap<CloudProvider, Arc<dyn Forecaster>>,
    default: Option<Arc<dyn Forecaster>>,
}

impl ForecasterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// An empty registry.
    pub fn empty() -> Self {
        RegistryBuilder::new().build()
    }

    /// Load every saved baseline artifact under `model_dir`.
    ///
    /// Looks for `<model_dir>/<provider>/model.json` for each known provider
    /// and `<model_dir>/default/model.json`. Missing artifacts are skipped;
    /// unreadable ones are errors.
    pub fn load_dir(model_dir: impl AsRef<Path>) -> ForecastResult<Self> {
        let model_dir = model_dir.as_ref();
        let mut builder = RegistryBuilder::new();

        for provider in CloudProvider::all() {
            let path = artifact_path(model_dir, provider.as_str());
            if path.exists() {
                let model = BaselineForecaster::load(&path)?;
                info!("[{}] Loaded model from {:?}", provider.tag(), path);
                builder = builder.register(provider, Arc::new(model));
            }
        }

        let default_path = artifact_path(model_dir, DEFAULT_MODEL_KEY);
        if default_path.exists() {
            let model = BaselineForecaster::load(&default_path)?;
            info!("Loaded default model from {:?}", default_path);
            builder = builder.with_default(Arc::new(model));
        }

        Ok(builder.build())
    }

    /// The provider's own forecaster, without falling back.
    pub fn get(&self, provider: CloudProvider) -> Option<Arc<dyn Forecaster>> {
        self.forecasters.get(&provider).cloned()
    }

    /// The provider's forecaster, or the default one.
    pub fn resolve(&self, provider: CloudProvider) -> ForecastResult<Arc<dyn Forecaster>> {
        if let Some(forecaster) = self.get(provider) {
            return Ok(forecaster);
        }
        match &self.default {
            Some(default) => {
                debug!("No model for {}; using default", provider);
                Ok(default.clone())
            }
            None => Err(ForecastError::UnregisteredProvider(provider.to_string())),
        }
    }

    /// Resolve a free-form provider key from a request.
    ///
    /// Unknown keys are unregistered even when a default exists.
    pub fn resolve_key(&self, key: &str) -> ForecastResult<(CloudProvider, Arc<dyn Forecaster>)> {
        let provider = CloudProvider::parse(key)
            .ok_or_else(|| ForecastError::UnregisteredProvider(key.to_string()))?;
        Ok((provider, self.resolve(provider)?))
    }

    /// Providers with their own forecaster, in order.
    pub fn providers(&self) -> Vec<CloudProvider> {
        self.forecasters.keys().copied().collect()
    }

    /// Registered keys, including `default` when present.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .forecasters
            .keys()
            .map(|p| p.as_str().to_string())
            .collect();
        if self.default.is_some() {
            keys.push(DEFAULT_MODEL_KEY.to_string());
        }
        keys
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Number of registered forecasters, default included.
    pub fn len(&self) -> usize {
        self.forecasters.len() + usize::from(self.default.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ForecasterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecasterRegistry")
            .field("providers", &self.providers())
            .field("default", &self.default.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ModelMetadata;
    use crate::mock::MockForecaster;

    fn mock() -> Arc<dyn Forecaster> {
        Arc::new(MockForecaster::new(ModelMetadata::new(None, 5, 3)))
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = ForecasterRegistry::builder()
            .register(CloudProvider::Gcp, mock())
            .build();

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve(CloudProvider::Gcp).is_ok());
        assert!(matches!(
            registry.resolve(CloudProvider::Azure),
            Err(ForecastError::UnregisteredProvider(_))
        ));
    }

    #[test]
    fn test_default_fallback() {
        let registry = ForecasterRegistry::builder()
            .register(CloudProvider::Gcp, mock())
            .with_default(mock())
            .build();

        assert!(registry.get(CloudProvider::Azure).is_none());
        assert!(registry.resolve(CloudProvider::Azure).is_ok());
        assert_eq!(registry.keys(), vec!["gcp", "default"]);
    }

    #[test]
    fn test_unknown_key_is_unregistered_even_with_default() {
        let registry = ForecasterRegistry::builder().with_default(mock()).build();
        assert!(matches!(
            registry.resolve_key("oracle"),
            Err(ForecastError::UnregisteredProvider(key)) if key == "oracle"
        ));
        let (provider, _) = registry.resolve_key("AWS").unwrap();
        assert_eq!(provider, CloudProvider::Aws);
    }

    #[test]
    fn test_empty_registry() {
        let registry = ForecasterRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn test_load_dir_skips_missing_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let model = BaselineForecaster::new(
            ModelMetadata::new(Some(CloudProvider::Azure), 4, 2).with_quantiles(vec![0.5]),
            vec![0.0],
        )
        .unwrap();
        model.save(artifact_path(dir.path(), "azure")).unwrap();

        let registry = ForecasterRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.providers(), vec![CloudProvider::Azure]);
        assert!(!registry.has_default());
        assert_eq!(
            registry.get(CloudProvider::Azure).unwrap().metadata().encoder_length,
            4
        );
    }

    #[test]
    fn test_load_dir_rejects_corrupt_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact_path(dir.path(), "gcp");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            ForecasterRegistry::load_dir(dir.path()),
            Err(ForecastError::Json(_))
        ));
    }
}
