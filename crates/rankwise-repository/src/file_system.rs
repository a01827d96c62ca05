//! File system based store
//!
//! Layout under the root directory:
//!
//! ```text
//! catalog.json
//! versions/<config>/<version>.json
//! ```

use async_trait::async_trait;
use path_absolutize::Absolutize;
use rankwise_core::{AttributeCatalog, ConfigId, VersionKey};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::{ConfigStore, RepositoryError, RepositoryResult, StoredVersion};

const CATALOG_FILE: &str = "catalog.json";
const VERSIONS_DIR: &str = "versions";

/// JSON documents on disk
pub struct FileSystemStore {
    root_path: PathBuf,
    /// Serializes check-then-write sequences within this process
    write_lock: Mutex<()>,
}

impl FileSystemStore {
    /// Open an existing root directory
    ///
    /// # Example
    /// ```no_run
    /// use rankwise_repository::FileSystemStore;
    ///
    /// let store = FileSystemStore::new("config-data").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(root_path: P) -> RepositoryResult<Self> {
        let path = root_path.as_ref();

        if !path.is_dir() {
            return Err(RepositoryError::InvalidPath {
                path: path.to_path_buf(),
            });
        }

        let abs_path = path
            .absolutize()
            .map_err(|e| RepositoryError::Other(format!("Failed to absolutize path: {}", e)))?
            .to_path_buf();

        Ok(Self {
            root_path: abs_path,
            write_lock: Mutex::new(()),
        })
    }

    /// Open `root_path`, creating it first if needed
    pub async fn create<P: AsRef<Path>>(root_path: P) -> RepositoryResult<Self> {
        fs::create_dir_all(root_path.as_ref()).await?;
        Self::new(root_path)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn catalog_path(&self) -> PathBuf {
        self.root_path.join(CATALOG_FILE)
    }

    fn config_dir(&self, config_id: &ConfigId) -> RepositoryResult<PathBuf> {
        check_name(config_id.as_str())?;
        Ok(self.root_path.join(VERSIONS_DIR).join(config_id.as_str()))
    }

    fn version_path(&self, key: &VersionKey) -> RepositoryResult<PathBuf> {
        Ok(self
            .config_dir(&key.config_id)?
            .join(format!("{}.json", key.version_num)))
    }
}

/// Config names become directory names; reject anything that could escape
/// the root or collide with hidden files
fn check_name(name: &str) -> RepositoryResult<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '\0') || c.is_control());
    if bad {
        return Err(RepositoryError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> RepositoryResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl ConfigStore for FileSystemStore {
    async fn load_catalog(&self) -> RepositoryResult<AttributeCatalog> {
        let path = self.catalog_path();
        if !fs::try_exists(&path).await? {
            return Ok(AttributeCatalog::new());
        }
        let content = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn save_catalog(&self, catalog: &AttributeCatalog) -> RepositoryResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut stored = self.load_catalog().await?;
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

        write_json(&self.catalog_path(), &stored).await?;
        tracing::debug!("Wrote catalog with {} attributes", stored.len());
        Ok(())
    }

    async fn load_version(&self, key: &VersionKey) -> RepositoryResult<StoredVersion> {
        let path = self.version_path(key)?;
        if !fs::try_exists(&path).await? {
            return Err(RepositoryError::NotFound {
                what: format!("version {} ({})", key, path.display()),
            });
        }
        let content = fs::read_to_string(&path).await?;
        let stored: StoredVersion = serde_json::from_str(&content)?;
        if &stored.key != key {
            return Err(RepositoryError::Other(format!(
                "{} holds version {}, expected {}",
                path.display(),
                stored.key,
                key
            )));
        }
        Ok(stored)
    }

    async fn save_version(&self, version: &StoredVersion) -> RepositoryResult<()> {
        let path = self.version_path(&version.key)?;
        let _guard = self.write_lock.lock().await;

        if fs::try_exists(&path).await? {
            return Err(RepositoryError::AlreadyExists {
                what: format!("version {}", version.key),
            });
        }
        write_json(&path, version).await?;
        tracing::info!("Saved version {} to {}", version.key, path.display());
        Ok(())
    }

    async fn list_versions(&self) -> RepositoryResult<Vec<VersionKey>> {
        let versions_dir = self.root_path.join(VERSIONS_DIR);
        if !fs::try_exists(&versions_dir).await? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut configs = fs::read_dir(&versions_dir).await?;
        while let Some(config) = configs.next_entry().await? {
            if !config.file_type().await?.is_dir() {
                continue;
            }
            let Some(config_name) = config.file_name().to_str().map(str::to_string) else {
                continue;
            };

            let mut files = fs::read_dir(config.path()).await?;
            while let Some(file) = files.next_entry().await? {
                let path = file.path();
                if path.extension().and_then(|s| s.to_str()) != Some("json") {
                    continue;
                }
                match path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u32>().ok())
                {
                    Some(num) => keys.push(VersionKey::new(config_name.as_str(), num)),
                    None => tracing::warn!("Ignoring unexpected file {}", path.display()),
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &VersionKey) -> RepositoryResult<bool> {
        Ok(fs::try_exists(self.version_path(key)?).await?)
    }
}
