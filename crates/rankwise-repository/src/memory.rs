//! In-memory store
//!
//! Suitable for tests and for engines that hydrate from elsewhere; contents
//! are lost when the process exits.

use async_trait::async_trait;
use rankwise_core::{AttributeCatalog, VersionKey};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::{ConfigStore, RepositoryError, RepositoryResult, StoredVersion};

#[derive(Default)]
pub struct MemoryStore {
    catalog: RwLock<AttributeCatalog>,
    versions: RwLock<BTreeMap<VersionKey, StoredVersion>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load_catalog(&self) -> RepositoryResult<AttributeCatalog> {
        Ok(self.catalog.read().await.clone())
    }

    async fn save_catalog(&self, catalog: &AttributeCatalog) -> RepositoryResult<()> {
        let mut stored = self.catalog.write().await;
        for attr in catalog.iter() {
            match stored.get(attr.id) {
                Some(existing) if existing == attr => {}
                Some(existing) => {
                    return Err(RepositoryError::AlreadyExists {
                        what: format!("attribute {} as '{}'", attr.id, existing.name),
                    })
                }
                None => stored.insert(attr.clone())?,
            }
        }
        Ok(())
    }

    async fn load_version(&self, key: &VersionKey) -> RepositoryResult<StoredVersion> {
        self.versions
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                what: format!("version {}", key),
            })
    }

    async fn save_version(&self, version: &StoredVersion) -> RepositoryResult<()> {
        let mut versions = self.versions.write().await;
        if versions.contains_key(&version.key) {
            return Err(RepositoryError::AlreadyExists {
                what: format!("version {}", version.key),
            });
        }
        versions.insert(version.key.clone(), version.clone());
        tracing::debug!("Stored version {} in memory", version.key);
        Ok(())
    }

    async fn list_versions(&self) -> RepositoryResult<Vec<VersionKey>> {
        Ok(self.versions.read().await.keys().cloned().collect())
    }

    async fn exists(&self, key: &VersionKey) -> RepositoryResult<bool> {
        Ok(self.versions.read().await.contains_key(key))
    }
}
