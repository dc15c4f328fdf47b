//! Key-value persistence for the client-held session. The surface mirrors
//! the web client's local storage: get/set/remove on string keys.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;
    /// Removal is best-effort and never fails; backends log and carry on.
    fn remove(&mut self, key: &str);
}

/// Volatile store for tests and one-shot invocations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// File-backed store: the whole key space is one JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`, loading existing entries when the file is
    /// present. A missing or unreadable file starts the store empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Self { path, entries }
    }

    fn persist(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            if let Err(e) = self.persist() {
                tracing::warn!("failed to persist session store after removal: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FileStore, MemoryStore, SessionStore};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("insights-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));

        store.remove("k");
        assert_eq!(store.get("k"), None);
        // Removing an absent key is a no-op.
        store.remove("k");
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = temp_path("reopen");
        let _ = std::fs::remove_file(&path);

        let mut store = FileStore::open(&path);
        store.set("token", "abc").unwrap();
        store.set("user", "{}").unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("token").as_deref(), Some("abc"));
        assert_eq!(reopened.get("user").as_deref(), Some("{}"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn file_store_starts_empty_on_corrupt_file() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get("token"), None);

        let _ = std::fs::remove_file(&path);
    }
}
