//! Pseudonymous visitor identity, persisted in client-local storage.
//!
//! The id is generated once per client profile and never re-derived from
//! server data. It distinguishes "own" contributions from everyone else's.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GuestbookError, Result};

/// Storage key holding the visitor id.
pub const VISITOR_ID_KEY: &str = "guestbook_visitor_id";

/// Length of the random suffix appended to the time component.
const SUFFIX_LEN: usize = 9;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Pseudonymous identifier of a contributor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitorId(String);

impl VisitorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generate a fresh id: `visitor_<unix millis>_<9 base-36 chars>`.
///
/// Not cryptographically secure; the time component plus the random suffix
/// keep collisions between concurrent first-time visitors negligible.
pub fn generate_visitor_id() -> VisitorId {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    VisitorId(format!("visitor_{millis}_{suffix}"))
}

/// Client-local key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Volatile store, lost with the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| GuestbookError::Storage("memory store poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| GuestbookError::Storage("memory store poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object on disk. Writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(serde_json::Map::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                GuestbookError::Storage(format!(
                    "Failed to parse state file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::Map::new()),
            Err(e) => Err(GuestbookError::Storage(format!(
                "Failed to read state file {}: {e}",
                self.path.display()
            ))),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .load()?
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), serde_json::Value::String(value.to_string()));

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                GuestbookError::Storage(format!(
                    "Failed to create state directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let json = serde_json::to_vec_pretty(&values)
            .map_err(|e| GuestbookError::Storage(format!("Failed to serialize state: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                GuestbookError::Storage(format!(
                    "Failed to write state file {}: {e}",
                    self.path.display()
                ))
            })
    }
}

/// Lazily created, persisted visitor identity.
pub struct VisitorIdentity<K> {
    store: K,
    cached: Option<VisitorId>,
}

impl<K: KeyValueStore> VisitorIdentity<K> {
    pub fn new(store: K) -> Self {
        Self {
            store,
            cached: None,
        }
    }

    /// Read the persisted id, generating and persisting one on first use.
    ///
    /// Idempotent: every call within a session returns the same id.
    pub fn get_or_create(&mut self) -> Result<VisitorId> {
        if let Some(id) = &self.cached {
            return Ok(id.clone());
        }

        let id = match self.store.get(VISITOR_ID_KEY)? {
            Some(existing) if !existing.trim().is_empty() => {
                debug!(visitor_id = %existing, "Loaded persisted visitor id");
                VisitorId(existing)
            }
            _ => {
                let fresh = generate_visitor_id();
                self.store.set(VISITOR_ID_KEY, fresh.as_str())?;
                info!(visitor_id = %fresh, "Generated new visitor id");
                fresh
            }
        };

        self.cached = Some(id.clone());
        Ok(id)
    }

    pub fn store(&self) -> &K {
        &self.store
    }
}

impl<K> fmt::Debug for VisitorIdentity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitorIdentity")
            .field("cached", &self.cached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_format() {
        let id = generate_visitor_id();
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "visitor");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(generate_visitor_id(), generate_visitor_id());
    }

    #[test]
    fn test_get_or_create_is_idempotent_and_persists() {
        let mut identity = VisitorIdentity::new(MemoryKeyValueStore::new());
        let first = identity.get_or_create().unwrap();
        let second = identity.get_or_create().unwrap();
        assert_eq!(first, second);
        assert_eq!(
            identity.store().get(VISITOR_ID_KEY).unwrap().as_deref(),
            Some(first.as_str())
        );
    }

    #[test]
    fn test_existing_id_is_reused() {
        let store = MemoryKeyValueStore::new();
        store.set(VISITOR_ID_KEY, "visitor_1_abc").unwrap();
        let mut identity = VisitorIdentity::new(store);
        assert_eq!(identity.get_or_create().unwrap().as_str(), "visitor_1_abc");
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("guestbook-kv-{}", generate_visitor_id()));
        let path = dir.join("nested").join("state.json");

        let first = VisitorIdentity::new(FileKeyValueStore::new(&path))
            .get_or_create()
            .unwrap();
        let second = VisitorIdentity::new(FileKeyValueStore::new(&path))
            .get_or_create()
            .unwrap();
        assert_eq!(first, second);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let store = FileKeyValueStore::new(std::env::temp_dir().join("guestbook-does-not-exist.json"));
        assert_eq!(store.get(VISITOR_ID_KEY).unwrap(), None);
    }
}
