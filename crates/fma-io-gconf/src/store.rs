//! Flat key-value store contract and an in-memory implementation
//!
//! Keys are absolute `/`-separated paths. Directories exist implicitly
//! as long as a key lives below them.

use fma_object::DataValue;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback run after a key is set or unset
///
/// Receives the full key and the new value (`None` when unset).
pub type Watcher = Arc<dyn Fn(&str, Option<&DataValue>) + Send + Sync>;

/// Store failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key or directory is locked
    #[error("key is not writable: {0}")]
    Locked(String),

    /// Snapshot file could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not valid JSON
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Read/write contract of the key registry
pub trait KeyStore {
    /// Value of a key
    fn get(&self, key: &str) -> Option<DataValue>;

    /// Set a key
    ///
    /// # Errors
    ///
    /// [`StoreError::Locked`] when the key is not writable.
    fn set(&self, key: &str, value: DataValue) -> Result<(), StoreError>;

    /// Remove every key under `dir`
    ///
    /// # Errors
    ///
    /// [`StoreError::Locked`] when a key below is not writable.
    fn unset_recursive(&self, dir: &str) -> Result<(), StoreError>;

    /// Full paths of the directories directly under `dir`, sorted
    fn subdirs(&self, dir: &str) -> Vec<String>;

    /// Names of the keys directly under `dir`, sorted
    fn entries(&self, dir: &str) -> Vec<String>;

    /// Whether `key` (or anything under it) may be written
    fn is_writable(&self, key: &str) -> bool;

    /// Run `watcher` after every change under `prefix`
    fn watch(&self, _prefix: &str, _watcher: Watcher) {}
}

#[derive(Default)]
struct StoreState {
    values: BTreeMap<String, DataValue>,
    locked: BTreeSet<String>,
    watchers: Vec<(String, Watcher)>,
}

impl StoreState {
    fn is_locked(&self, key: &str) -> bool {
        self.locked.iter().any(|prefix| is_under(key, prefix))
    }

    fn watchers_for(&self, key: &str) -> Vec<Watcher> {
        self.watchers
            .iter()
            .filter(|(prefix, _)| is_under(key, prefix))
            .map(|(_, w)| Arc::clone(w))
            .collect()
    }
}

fn is_under(key: &str, dir: &str) -> bool {
    let dir = dir.trim_end_matches('/');
    key == dir || key.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

/// Shared in-memory key store
///
/// Clones share the same data, so a clone can play another process
/// editing the registry. Watchers run outside the lock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreState>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("MemoryStore")
            .field("keys", &state.values.len())
            .field("locked", &state.locked)
            .field("watchers", &state.watchers.len())
            .finish()
    }
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `dir` and everything under it read-only
    pub fn lock(&self, dir: impl Into<String>) {
        self.inner.lock().locked.insert(dir.into());
    }

    /// Make `dir` writable again
    pub fn unlock(&self, dir: &str) {
        self.inner.lock().locked.remove(dir);
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    /// Whether the store holds no key
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().values.is_empty()
    }

    /// Load a JSON snapshot written by [`MemoryStore::save_json`]
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] or [`StoreError::Snapshot`].
    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let values: BTreeMap<String, DataValue> = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), keys = values.len(), "registry snapshot loaded");
        let store = Self::new();
        store.inner.lock().values = values;
        Ok(store)
    }

    /// Write every key to a JSON snapshot
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] or [`StoreError::Snapshot`].
    pub fn save_json(&self, path: &Path) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(&self.inner.lock().values)?;
        std::fs::write(path, text).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn notify(&self, key: &str, value: Option<&DataValue>) {
        let watchers = self.inner.lock().watchers_for(key);
        for watcher in watchers {
            watcher(key, value);
        }
    }
}

impl KeyStore for MemoryStore {
    fn get(&self, key: &str) -> Option<DataValue> {
        self.inner.lock().values.get(key).cloned()
    }

    fn set(&self, key: &str, value: DataValue) -> Result<(), StoreError> {
        {
            let mut state = self.inner.lock();
            if state.is_locked(key) {
                return Err(StoreError::Locked(key.to_string()));
            }
            state.values.insert(key.to_string(), value.clone());
        }
        self.notify(key, Some(&value));
        Ok(())
    }

    fn unset_recursive(&self, dir: &str) -> Result<(), StoreError> {
        let removed: Vec<String> = {
            let mut state = self.inner.lock();
            if state.is_locked(dir) {
                return Err(StoreError::Locked(dir.to_string()));
            }
            let keys: Vec<String> = state
                .values
                .keys()
                .filter(|k| is_under(k, dir))
                .cloned()
                .collect();
            if let Some(locked) = keys.iter().find(|k| state.is_locked(k)) {
                return Err(StoreError::Locked(locked.clone()));
            }
            for key in &keys {
                state.values.remove(key);
            }
            keys
        };
        for key in removed {
            self.notify(&key, None);
        }
        Ok(())
    }

    fn subdirs(&self, dir: &str) -> Vec<String> {
        let dir = dir.trim_end_matches('/');
        let state = self.inner.lock();
        let mut found = BTreeSet::new();
        for key in state.values.keys() {
            if let Some(rest) = key.strip_prefix(dir).and_then(|r| r.strip_prefix('/')) {
                if let Some((sub, _)) = rest.split_once('/') {
                    found.insert(format!("{dir}/{sub}"));
                }
            }
        }
        found.into_iter().collect()
    }

    fn entries(&self, dir: &str) -> Vec<String> {
        let dir = dir.trim_end_matches('/');
        let state = self.inner.lock();
        state
            .values
            .keys()
            .filter_map(|key| key.strip_prefix(dir).and_then(|r| r.strip_prefix('/')))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect()
    }

    fn is_writable(&self, key: &str) -> bool {
        !self.inner.lock().is_locked(key)
    }

    fn watch(&self, prefix: &str, watcher: Watcher) {
        self.inner.lock().watchers.push((prefix.to_string(), watcher));
    }
}
