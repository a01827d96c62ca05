//! Persistence layer for Rankwise
//!
//! The resolver only ever needs three things from storage: the attribute
//! catalog, a version's rows and rules, and a way to save a new version. This
//! crate provides that interface ([`ConfigStore`]) and its backends.
//!
//! # Backends
//!
//! - **Memory**: process-local maps, for tests and embedded use
//! - **File system**: JSON documents under a root directory
//! - **PostgreSQL** (`postgres` feature): the relational EAV layout
//!
//! # Quick Start
//!
//! ```no_run
//! use rankwise_repository::{open_store, RepositoryConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = open_store(&RepositoryConfig::file_system("config-data")).await?;
//!
//!     let catalog = store.load_catalog().await?;
//!     for key in store.list_versions().await? {
//!         let stored = store.load_version(&key).await?;
//!         println!("{}: {} rows", key, stored.rows.len());
//!     }
//!     println!("{} attributes", catalog.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod file_system;
pub mod memory;
pub mod models;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use config::{ConfigError, RepositoryConfig, RepositorySource};
pub use error::{RepositoryError, RepositoryResult};
pub use file_system::FileSystemStore;
pub use memory::MemoryStore;
pub use models::StoredVersion;
pub use traits::ConfigStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use std::sync::Arc;

/// Open the backend selected by `config`
pub async fn open_store(config: &RepositoryConfig) -> RepositoryResult<Arc<dyn ConfigStore>> {
    config.validate()?;

    match config.source {
        RepositorySource::Memory => Ok(Arc::new(MemoryStore::new())),
        RepositorySource::FileSystem => {
            let path = config.base_path.as_deref().unwrap_or_default();
            Ok(Arc::new(FileSystemStore::create(path).await?))
        }
        #[cfg(feature = "postgres")]
        RepositorySource::Database => {
            let url = config.database_url.as_deref().unwrap_or_default();
            let store = PostgresStore::connect(url, config.max_connections).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        RepositorySource::Database => Err(RepositoryError::Other(
            "database source requires the `postgres` feature".to_string(),
        )),
    }
}
