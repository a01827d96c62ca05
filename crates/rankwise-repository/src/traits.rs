//! Storage interface consumed by the engine

use async_trait::async_trait;
use rankwise_core::{AttributeCatalog, VersionKey};

use crate::{RepositoryResult, StoredVersion};

/// Persistent home of the attribute catalog and committed versions
///
/// Versions are write-once: `save_version` fails with
/// [`AlreadyExists`](crate::RepositoryError::AlreadyExists) for a key that is
/// already stored. Catalog saves are additive; attributes are never removed.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// The stored catalog; empty when none was saved yet
    async fn load_catalog(&self) -> RepositoryResult<AttributeCatalog>;

    async fn save_catalog(&self, catalog: &AttributeCatalog) -> RepositoryResult<()>;

    async fn load_version(&self, key: &VersionKey) -> RepositoryResult<StoredVersion>;

    async fn save_version(&self, version: &StoredVersion) -> RepositoryResult<()>;

    /// Keys of every stored version, ascending
    async fn list_versions(&self) -> RepositoryResult<Vec<VersionKey>>;

    /// Whether `key` is stored
    async fn exists(&self, key: &VersionKey) -> RepositoryResult<bool> {
        Ok(self.list_versions().await?.contains(key))
    }
}
