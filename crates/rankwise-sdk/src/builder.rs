//! Builder pattern for ConfigEngine

use crate::config::EngineConfig;
use crate::engine::ConfigEngine;
use crate::error::Result;
use rankwise_core::{AttributeCatalog, DataType, Role};
use rankwise_repository::{open_store, ConfigStore, RepositoryConfig};
use std::sync::Arc;

/// Builder for ConfigEngine
///
/// # Example
///
/// ```rust,ignore
/// use rankwise_sdk::{ConfigEngineBuilder, RepositoryConfig};
///
/// // Versions persisted under ./data and reloaded on every start
/// let engine = ConfigEngineBuilder::new()
///     .with_repository(RepositoryConfig::file_system("data"))
///     .build()
///     .await?;
/// ```
pub struct ConfigEngineBuilder {
    config: EngineConfig,
    store: Option<Arc<dyn ConfigStore>>,
    catalog: AttributeCatalog,
    pending: Vec<(String, Role, DataType)>,
}

impl ConfigEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
            store: None,
            catalog: AttributeCatalog::new(),
            pending: Vec::new(),
        }
    }

    /// Replace the whole engine configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Repository opened at build time; ignored when a store is given
    pub fn with_repository(mut self, repository: RepositoryConfig) -> Self {
        self.config.repository = repository;
        self
    }

    /// Use an already opened store
    pub fn with_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attributes merged into the stored catalog
    pub fn with_catalog(mut self, catalog: AttributeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Define an attribute at build time unless the stored catalog already has it
    pub fn with_attribute(mut self, name: impl Into<String>, role: Role, data_type: DataType) -> Self {
        self.pending.push((name.into(), role, data_type));
        self
    }

    pub fn activate_on_ingest(mut self, enabled: bool) -> Self {
        self.config.activate_on_ingest = enabled;
        self
    }

    /// Open the store, merge the catalog and reload every stored version
    pub async fn build(self) -> Result<ConfigEngine> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => open_store(&self.config.repository).await?,
        };

        if !self.catalog.is_empty() {
            store.save_catalog(&self.catalog).await?;
        }
        let mut catalog = store.load_catalog().await?;
        let mut defined = false;
        for (name, role, data_type) in self.pending {
            if !catalog.contains(&name) {
                catalog.define(name, role, data_type)?;
                defined = true;
            }
        }
        if defined {
            store.save_catalog(&catalog).await?;
        }

        let engine = ConfigEngine::from_parts(self.config, catalog, Some(store));
        let loaded = engine.hydrate().await?;
        tracing::info!(
            "Config engine ready: {} attributes, {} stored versions",
            engine.catalog().len(),
            loaded
        );
        Ok(engine)
    }
}

impl Default for ConfigEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
