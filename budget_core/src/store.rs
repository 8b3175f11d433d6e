//! Persisted key/value configuration store.
//!
//! The host owns the real store; the tracker only needs string get/set under a
//! `(group, key)` pair. Every collection the tracker persists is a JSON document
//! stored under one key.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use budget_schema::CONFIG_GROUP;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write store to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("store file {path:?} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub trait ConfigStore: Send + Sync {
    fn get(&self, group: &str, key: &str) -> Option<String>;
    fn set(&self, group: &str, key: &str, value: &str) -> Result<(), StoreError>;
}

fn compound_key(group: &str, key: &str) -> String {
    format!("{group}.{key}")
}

/// In-process store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, e.g. to simulate data written by an earlier session.
    pub fn with_value(self, group: &str, key: &str, value: impl Into<String>) -> Self {
        self.values
            .lock()
            .insert(compound_key(group, key), value.into());
        self
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, group: &str, key: &str) -> Option<String> {
        self.values.lock().get(&compound_key(group, key)).cloned()
    }

    fn set(&self, group: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.values
            .lock()
            .insert(compound_key(group, key), value.to_string());
        Ok(())
    }
}

/// Whole store kept as one JSON object of `"group.key" -> value`, rewritten on every set.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let encoded =
            serde_json::to_string_pretty(values).map_err(|source| StoreError::Encode {
                key: self.path.display().to_string(),
                source,
            })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, encoded).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, group: &str, key: &str) -> Option<String> {
        self.values.lock().get(&compound_key(group, key)).cloned()
    }

    fn set(&self, group: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        values.insert(compound_key(group, key), value.to_string());
        self.flush(&values)
    }
}

/// Decode the JSON document under `key`, falling back to `T::default()` when it is
/// missing, empty, or malformed.
pub fn load_json_or_default<T>(store: &dyn ConfigStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(CONFIG_GROUP, key) else {
        return T::default();
    };
    if raw.trim().is_empty() || raw.trim() == "null" {
        return T::default();
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(
                target: "fifty_fifty::store",
                key,
                error = %err,
                "store.load_failed=using_empty"
            );
            T::default()
        }
    }
}

/// Encode `value` as JSON under `key`. Failures are logged and swallowed; the
/// in-memory state stays authoritative for this session.
pub fn save_json<T>(store: &dyn ConfigStore, key: &str, value: &T)
where
    T: Serialize + ?Sized,
{
    let encoded = match serde_json::to_string(value) {
        Ok(encoded) => encoded,
        Err(source) => {
            let err = StoreError::Encode {
                key: key.to_string(),
                source,
            };
            tracing::warn!(target: "fifty_fifty::store", error = %err, "store.save_failed");
            return;
        }
    };
    if let Err(err) = store.set(CONFIG_GROUP, key, &encoded) {
        tracing::warn!(target: "fifty_fifty::store", key, error = %err, "store.save_failed");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("fifty_fifty_{name}_{nanos}.json"))
    }

    #[test]
    fn memory_store_round_trips_values() {
        let store = MemoryStore::new();
        assert!(store.get("g", "k").is_none());
        store.set("g", "k", "v").unwrap();
        assert_eq!(store.get("g", "k").as_deref(), Some("v"));
        assert!(store.get("other", "k").is_none());
    }

    #[test]
    fn corrupt_json_falls_back_to_default() {
        let store = MemoryStore::new().with_value(CONFIG_GROUP, "enemyKills", "{not json");
        let loaded: HashMap<String, u32> = load_json_or_default(&store, "enemyKills");
        assert!(loaded.is_empty());
    }

    #[test]
    fn null_and_empty_documents_are_empty() {
        let store = MemoryStore::new()
            .with_value(CONFIG_GROUP, "a", "null")
            .with_value(CONFIG_GROUP, "b", "");
        let a: HashMap<String, u32> = load_json_or_default(&store, "a");
        let b: HashMap<String, u32> = load_json_or_default(&store, "b");
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = scratch_path("reopen");
        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set(CONFIG_GROUP, "enemyKills", r#"{"Goblin":3}"#).unwrap();
        }
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(CONFIG_GROUP, "enemyKills").as_deref(),
            Some(r#"{"Goblin":3}"#)
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let path = scratch_path("corrupt");
        fs::write(&path, "[1, 2").unwrap();
        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        let _ = fs::remove_file(&path);
    }
}
