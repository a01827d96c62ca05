//! Append-only version arena
//!
//! Committed versions live in a [`StoreSnapshot`] published through an
//! [`ArcSwap`]. Readers load the current snapshot without locking and keep
//! using it for as long as they hold the `Arc`, so an activation never disturbs
//! in-flight resolutions. Writers serialize on a mutex, clone the snapshot,
//! apply their change and publish the result in one swap.

use crate::error::{LoadError, ResolveError};
use crate::loader::VersionDraft;
use crate::precedence::PrecedenceTable;
use crate::version::ConfigVersion;
use arc_swap::ArcSwap;
use rankwise_core::{ConfigId, ConfigVersionId, PrecedenceRule, VersionKey};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

/// A committed version and, once set, its precedence table
#[derive(Debug, Clone)]
pub struct VersionEntry {
    version: Arc<ConfigVersion>,
    precedence: Option<Arc<PrecedenceTable>>,
}

impl VersionEntry {
    pub fn version(&self) -> &Arc<ConfigVersion> {
        &self.version
    }

    pub fn precedence(&self) -> Option<&Arc<PrecedenceTable>> {
        self.precedence.as_ref()
    }

    pub fn key(&self) -> &VersionKey {
        self.version.key()
    }

    pub fn id(&self) -> ConfigVersionId {
        self.version.id()
    }

    /// The precedence table, or `MissingPrecedence` for a version still
    /// waiting for its rules
    pub fn require_precedence(&self) -> Result<&Arc<PrecedenceTable>, ResolveError> {
        self.precedence
            .as_ref()
            .ok_or_else(|| ResolveError::MissingPrecedence {
                key: self.key().clone(),
            })
    }
}

/// Immutable view of the whole store at one point in time
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// Indexed by `ConfigVersionId - 1`
    entries: Vec<Arc<VersionEntry>>,
    index: HashMap<VersionKey, ConfigVersionId>,
    active: HashMap<ConfigId, ConfigVersionId>,
}

impl StoreSnapshot {
    pub fn get_by_id(&self, id: ConfigVersionId) -> Option<&Arc<VersionEntry>> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|slot| self.entries.get(slot))
    }

    pub fn get(&self, key: &VersionKey) -> Option<&Arc<VersionEntry>> {
        self.index.get(key).and_then(|id| self.get_by_id(*id))
    }

    pub fn contains(&self, key: &VersionKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn active(&self, config_id: &ConfigId) -> Option<&Arc<VersionEntry>> {
        self.active.get(config_id).and_then(|id| self.get_by_id(*id))
    }

    /// Committed versions of one config, ascending by version number
    pub fn versions_of(&self, config_id: &ConfigId) -> Vec<&Arc<VersionEntry>> {
        let mut versions: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.version.config_id() == config_id)
            .collect();
        versions.sort_by_key(|e| e.version.version_num());
        versions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<VersionEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_id(&self) -> ConfigVersionId {
        ConfigVersionId(self.entries.len() as u32 + 1)
    }

    fn push(&mut self, version: ConfigVersion, precedence: Option<PrecedenceTable>) -> ConfigVersionId {
        let id = self.next_id();
        let version = version.with_id(id);
        let precedence = precedence.map(|table| Arc::new(table.with_version_id(id)));
        self.index.insert(version.key().clone(), id);
        self.entries.push(Arc::new(VersionEntry {
            version: Arc::new(version),
            precedence,
        }));
        id
    }
}

/// Concurrent store of immutable config versions
pub struct VersionStore {
    snapshot: ArcSwap<StoreSnapshot>,
    writer: Mutex<()>,
}

impl VersionStore {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(StoreSnapshot::default()),
            writer: Mutex::new(()),
        }
    }

    /// Current snapshot; stays valid regardless of later writes
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshot.load_full()
    }

    /// Run `f` against a private copy of the snapshot and publish it on success
    fn write<T, E>(&self, f: impl FnOnce(&mut StoreSnapshot) -> Result<T, E>) -> Result<T, E> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = StoreSnapshot::clone(&self.snapshot.load());
        let out = f(&mut next)?;
        self.snapshot.store(Arc::new(next));
        Ok(out)
    }

    /// Add a version without rules; rules follow through [`set_rules`](Self::set_rules)
    pub fn create_version(&self, version: ConfigVersion) -> Result<Arc<ConfigVersion>, LoadError> {
        self.write(|snap| {
            ensure_absent(snap, version.key())?;
            let id = snap.push(version, None);
            let entry = snap
                .get_by_id(id)
                .ok_or_else(|| LoadError::Internal(format!("version {} vanished after insert", id)))?;
            tracing::info!("Created version {} as {}", entry.key(), id);
            Ok(entry.version.clone())
        })
    }

    /// Attach precedence rules to a version created without them
    pub fn set_rules(
        &self,
        id: ConfigVersionId,
        rules: Vec<PrecedenceRule>,
    ) -> Result<Arc<PrecedenceTable>, LoadError> {
        self.write(|snap| {
            let slot = (id.0 as usize)
                .checked_sub(1)
                .filter(|slot| *slot < snap.entries.len())
                .ok_or(LoadError::UnknownVersionId(id))?;
            let entry = snap.entries[slot].clone();
            if entry.precedence.is_some() {
                return Err(LoadError::RulesAlreadySet(entry.key().clone()));
            }

            let table = Arc::new(PrecedenceTable::build(&entry.version, rules)?);
            snap.entries[slot] = Arc::new(VersionEntry {
                version: entry.version.clone(),
                precedence: Some(table.clone()),
            });
            tracing::info!(
                "Set {} precedence ranks for {}",
                table.rank_count(),
                table.key()
            );
            Ok(table)
        })
    }

    /// Add a version together with the precedence table validated against it
    pub fn commit(&self, draft: VersionDraft) -> Result<ConfigVersionId, LoadError> {
        let mut ids = self.commit_all(vec![draft])?;
        ids.pop()
            .ok_or_else(|| LoadError::Internal("commit produced no version id".to_string()))
    }

    /// Add several versions in one publication
    ///
    /// If any key is already present, or repeats within the batch, nothing is
    /// committed.
    pub fn commit_all(
        &self,
        drafts: Vec<VersionDraft>,
    ) -> Result<Vec<ConfigVersionId>, LoadError> {
        self.write(|snap| {
            let mut batch = HashSet::new();
            for draft in &drafts {
                ensure_absent(snap, draft.key())?;
                if !batch.insert(draft.key().clone()) {
                    return Err(LoadError::DuplicateVersion {
                        key: draft.key().clone(),
                    });
                }
            }

            let mut ids = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let (version, table) = draft.into_parts();
                let key = version.key().clone();
                let ranks = table.rank_count();
                let id = snap.push(version, Some(table));
                tracing::info!("Committed version {} as {} ({} ranks)", key, id, ranks);
                ids.push(id);
            }
            Ok(ids)
        })
    }

    pub fn get_version(&self, key: &VersionKey) -> Result<Arc<VersionEntry>, ResolveError> {
        self.snapshot()
            .get(key)
            .cloned()
            .ok_or_else(|| ResolveError::VersionNotFound { key: key.clone() })
    }

    pub fn get_by_id(&self, id: ConfigVersionId) -> Option<Arc<VersionEntry>> {
        self.snapshot().get_by_id(id).cloned()
    }

    pub fn precedence(&self, key: &VersionKey) -> Result<Arc<PrecedenceTable>, ResolveError> {
        self.get_version(key)?.require_precedence().cloned()
    }

    /// Make `key` the serving version of its config
    ///
    /// Returns the previously active version, if any. Only versions with a
    /// precedence table can be activated.
    pub fn activate(&self, key: &VersionKey) -> Result<Option<VersionKey>, ResolveError> {
        self.write(|snap| {
            let entry = snap
                .get(key)
                .ok_or_else(|| ResolveError::VersionNotFound { key: key.clone() })?;
            entry.require_precedence()?;
            let id = entry.id();

            let previous = snap
                .active
                .insert(key.config_id.clone(), id)
                .and_then(|prev| snap.get_by_id(prev))
                .map(|prev| prev.key().clone());
            match &previous {
                Some(prev) => tracing::info!("Activated {} (was {})", key, prev),
                None => tracing::info!("Activated {}", key),
            }
            Ok(previous)
        })
    }

    pub fn active(&self, config_id: &ConfigId) -> Result<Arc<VersionEntry>, ResolveError> {
        self.snapshot()
            .active(config_id)
            .cloned()
            .ok_or_else(|| ResolveError::NoActiveVersion {
                config_id: config_id.clone(),
            })
    }

    pub fn versions_of(&self, config_id: &ConfigId) -> Vec<VersionKey> {
        self.snapshot()
            .versions_of(config_id)
            .into_iter()
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_absent(snap: &StoreSnapshot, key: &VersionKey) -> Result<(), LoadError> {
    if snap.contains(key) {
        return Err(LoadError::DuplicateVersion { key: key.clone() });
    }
    Ok(())
}
