//! Engine facade
//!
//! [`ConfigEngine`] ties the catalog, the in-memory version arena and an
//! optional persistent store together. It is cheap to clone and safe to share
//! across tasks; resolutions never wait on ingestion.

use crate::builder::ConfigEngineBuilder;
use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use arc_swap::ArcSwap;
use rankwise_core::{Attribute, AttributeCatalog, ConfigId, DataType, Facts, Role, VersionKey};
use rankwise_parser::{BundleDocument, BundleParser};
use rankwise_repository::{ConfigStore, StoredVersion};
use rankwise_runtime::{
    export, ConfigVersion, LoadError, Loader, Resolution, ResolutionTrace,
    ResolveError, Resolver, ValidatedBundle, ValidationWarning, VersionDraft, VersionEntry,
    VersionStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Outcome of a successful ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub keys: Vec<VersionKey>,
    pub warnings: Vec<ValidationWarning>,
    /// Saved to the configured store
    pub persisted: bool,
    /// Made the active version of their configs
    pub activated: bool,
}

/// A resolution together with the ranks it consulted
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub outcome: std::result::Result<Resolution, ResolveError>,
    pub trace: ResolutionTrace,
}

/// Shared configuration resolution engine
#[derive(Clone)]
pub struct ConfigEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    catalog: ArcSwap<AttributeCatalog>,
    versions: VersionStore,
    store: Option<Arc<dyn ConfigStore>>,
    /// Serializes catalog changes and ingestion
    writer: Mutex<()>,
}

impl ConfigEngine {
    /// In-memory engine without a persistent store
    pub fn new(config: EngineConfig) -> Self {
        Self::from_parts(config, AttributeCatalog::new(), None)
    }

    pub fn builder() -> ConfigEngineBuilder {
        ConfigEngineBuilder::new()
    }

    pub(crate) fn from_parts(
        config: EngineConfig,
        catalog: AttributeCatalog,
        store: Option<Arc<dyn ConfigStore>>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                catalog: ArcSwap::from_pointee(catalog),
                versions: VersionStore::new(),
                store,
                writer: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Current catalog snapshot
    pub fn catalog(&self) -> Arc<AttributeCatalog> {
        self.inner.catalog.load_full()
    }

    pub fn versions_store(&self) -> &VersionStore {
        &self.inner.versions
    }

    pub fn store(&self) -> Option<&Arc<dyn ConfigStore>> {
        self.inner.store.as_ref()
    }

    // ========== Catalog ==========

    /// Add an attribute to the catalog, persisting it when a store is configured
    pub async fn define_attribute(&self, name: &str, role: Role, data_type: DataType) -> Result<Attribute> {
        let _guard = self.inner.writer.lock().await;

        let mut next = AttributeCatalog::clone(&self.inner.catalog.load());
        let attr = next.define(name, role, data_type)?.clone();
        if let Some(store) = &self.inner.store {
            store.save_catalog(&next).await?;
        }
        self.inner.catalog.store(Arc::new(next));

        tracing::info!(
            "Defined attribute '{}' ({} {}) as {}",
            attr.name,
            attr.role,
            attr.data_type,
            attr.id
        );
        Ok(attr)
    }

    // ========== Ingestion ==========

    pub async fn ingest_json(&self, json: &str) -> Result<IngestReport> {
        let doc = BundleParser::parse_json(json)?;
        self.ingest_document(&doc).await
    }

    pub async fn ingest_yaml(&self, yaml: &str) -> Result<IngestReport> {
        let doc = BundleParser::parse_yaml(yaml)?;
        self.ingest_document(&doc).await
    }

    /// Validate, persist, commit and optionally activate every config of `doc`
    ///
    /// Validation runs against the current catalog before anything is written.
    /// A rejected bundle leaves both the store and the engine unchanged.
    pub async fn ingest_document(&self, doc: &BundleDocument) -> Result<IngestReport> {
        let _guard = self.inner.writer.lock().await;

        let catalog = self.catalog();
        let bundle = Loader::new(&catalog).load(doc)?;

        let snapshot = self.inner.versions.snapshot();
        if let Some(key) = bundle.keys().into_iter().find(|k| snapshot.contains(k)) {
            return Err(LoadError::DuplicateVersion { key }.into());
        }

        let persisted = self.persist(&bundle).await?;
        let keys = bundle.keys();
        let warnings = bundle.report.warnings.clone();
        Loader::install(&self.inner.versions, bundle)?;

        let activated = self.inner.config.activate_on_ingest;
        if activated {
            for key in &keys {
                self.inner.versions.activate(key)?;
            }
        }

        Ok(IngestReport {
            keys,
            warnings,
            persisted,
            activated,
        })
    }

    async fn persist(&self, bundle: &ValidatedBundle) -> Result<bool> {
        let Some(store) = self
            .inner
            .store
            .as_ref()
            .filter(|_| self.inner.config.persist_on_ingest)
        else {
            return Ok(false);
        };

        for draft in &bundle.drafts {
            if store.exists(draft.key()).await? {
                return Err(LoadError::DuplicateVersion {
                    key: draft.key().clone(),
                }
                .into());
            }
        }
        // TODO: save the drafts of one bundle in a single store transaction;
        // a failure midway currently leaves the earlier configs persisted.
        for draft in &bundle.drafts {
            store.save_version(&stored_version(draft)).await?;
        }
        Ok(true)
    }

    /// Reload every stored version into the arena; used once at build time
    pub(crate) async fn hydrate(&self) -> Result<usize> {
        let Some(store) = &self.inner.store else {
            return Ok(0);
        };

        let mut drafts = Vec::new();
        for key in store.list_versions().await? {
            let stored = store.load_version(&key).await?;
            let version = ConfigVersion::new(stored.key, stored.meta, stored.rows)?;
            drafts.push(VersionDraft::from_parts(version, stored.rules)?);
        }

        let mut latest: BTreeMap<ConfigId, VersionKey> = BTreeMap::new();
        for draft in &drafts {
            let key = draft.key();
            let newer = latest
                .get(&key.config_id)
                .map_or(true, |current| current.version_num < key.version_num);
            if newer {
                latest.insert(key.config_id.clone(), key.clone());
            }
        }

        let count = drafts.len();
        self.inner.versions.commit_all(drafts)?;
        if self.inner.config.activate_on_ingest {
            for key in latest.values() {
                self.inner.versions.activate(key)?;
            }
        }
        Ok(count)
    }

    // ========== Activation ==========

    /// Make `config_name@v{version_num}` the serving version; returns the previous one
    pub fn activate(&self, config_name: &str, version_num: u32) -> Result<Option<VersionKey>> {
        Ok(self
            .inner
            .versions
            .activate(&VersionKey::new(config_name, version_num))?)
    }

    pub fn active_version(&self, config_name: &str) -> Option<VersionKey> {
        self.inner
            .versions
            .active(&ConfigId::new(config_name))
            .ok()
            .map(|entry| entry.key().clone())
    }

    /// Committed versions of a config, ascending
    pub fn versions(&self, config_name: &str) -> Vec<VersionKey> {
        self.inner.versions.versions_of(&ConfigId::new(config_name))
    }

    // ========== Resolution ==========

    /// Resolve `facts` against a specific version
    pub fn resolve(&self, config_name: &str, version_num: u32, facts: &Facts) -> Result<Resolution> {
        let entry = self.entry(config_name, Some(version_num))?;
        self.resolve_with(&entry, facts)
    }

    /// Resolve `facts` against the active version of a config
    pub fn resolve_active(&self, config_name: &str, facts: &Facts) -> Result<Resolution> {
        let entry = self.entry(config_name, None)?;
        self.resolve_with(&entry, facts)
    }

    /// JSON in, JSON params out; `version_num: None` uses the active version
    pub fn resolve_json(
        &self,
        config_name: &str,
        version_num: Option<u32>,
        facts: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let catalog = self.catalog();
        let facts = Facts::from_json(&catalog, facts)?;
        let entry = self.entry(config_name, version_num)?;
        Ok(Resolver::new(&catalog).resolve_entry(&entry, &facts)?.to_json())
    }

    /// Resolve and report every consulted rank
    pub fn explain(&self, config_name: &str, version_num: Option<u32>, facts: &Facts) -> Result<Explanation> {
        let entry = self.entry(config_name, version_num)?;
        let table = entry.require_precedence()?;
        let catalog = self.catalog();
        let (outcome, trace) = Resolver::new(&catalog).resolve_traced(entry.version(), table, facts);
        Ok(Explanation { outcome, trace })
    }

    fn entry(&self, config_name: &str, version_num: Option<u32>) -> Result<Arc<VersionEntry>> {
        let entry = match version_num {
            Some(num) => self
                .inner
                .versions
                .get_version(&VersionKey::new(config_name, num))?,
            None => self.inner.versions.active(&ConfigId::new(config_name))?,
        };
        Ok(entry)
    }

    fn resolve_with(&self, entry: &VersionEntry, facts: &Facts) -> Result<Resolution> {
        let catalog = self.catalog();
        Resolver::new(&catalog)
            .resolve_entry(entry, facts)
            .map_err(SdkError::from)
    }

    // ========== Export ==========

    /// A committed version in ingestion form
    pub fn export(&self, config_name: &str, version_num: u32) -> Result<BundleDocument> {
        let entry = self.entry(config_name, Some(version_num))?;
        Ok(export::to_bundle(&self.catalog(), &[entry])?)
    }

    pub fn export_json(&self, config_name: &str, version_num: u32) -> Result<String> {
        let doc = self.export(config_name, version_num)?;
        Ok(BundleParser::to_json_pretty(&doc)?)
    }
}

fn stored_version(draft: &VersionDraft) -> StoredVersion {
    StoredVersion::new(
        draft.key().clone(),
        draft.version().meta().clone(),
        draft.version().rows().to_vec(),
        draft.table().rules().to_vec(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "config_id": 1,
        "name": "pricing",
        "version": 1,
        "configs": [{
            "name": "discounts",
            "rows": [
                { "match": [{ "key": "customer", "type": "str", "value": "ALL" }],
                  "params": [{ "key": "discount_pct", "type": "dec", "value": "0.10" }] },
                { "match": [{ "key": "customer", "type": "str", "value": "ACME" }],
                  "params": [{ "key": "discount_pct", "type": "dec", "value": "0.25" }] }
            ],
            "precedence_rank": [
                { "rank": 1, "customer": 1 },
                { "rank": 2, "customer": 0 }
            ]
        }]
    }"#;

    async fn engine() -> ConfigEngine {
        let engine = ConfigEngine::new(EngineConfig::default());
        engine
            .define_attribute("customer", Role::Match, DataType::Str)
            .await
            .unwrap();
        engine
            .define_attribute("discount_pct", Role::Param, DataType::Dec)
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_ingest_activates_and_resolves() {
        let engine = engine().await;
        let report = engine.ingest_json(BUNDLE).await.unwrap();
        assert_eq!(report.keys, vec![VersionKey::new("discounts", 1)]);
        assert!(report.activated);
        assert!(!report.persisted);

        let params = engine
            .resolve_json("discounts", None, &serde_json::json!({ "customer": "ACME" }))
            .unwrap();
        assert_eq!(params, serde_json::json!({ "discount_pct": "0.25" }));
    }

    #[tokio::test]
    async fn test_duplicate_attribute_rejected() {
        let engine = engine().await;
        let err = engine
            .define_attribute("customer", Role::Match, DataType::Int)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "duplicate_attribute");
    }

    #[tokio::test]
    async fn test_explain_reports_fallthrough() {
        let engine = engine().await;
        engine.ingest_json(BUNDLE).await.unwrap();

        let facts = Facts::new().with("customer", "OTHERCO");
        let explanation = engine.explain("discounts", Some(1), &facts).unwrap();
        assert_eq!(explanation.trace.consulted_ranks(), vec![1, 2]);
        assert_eq!(explanation.outcome.unwrap().row_index, 0);
    }

    #[tokio::test]
    async fn test_unknown_config_has_no_active_version() {
        let engine = engine().await;
        let err = engine.resolve_active("discounts", &Facts::new()).unwrap_err();
        assert_eq!(err.kind(), "no_active_version");
        assert_eq!(engine.active_version("discounts"), None);
    }
}
