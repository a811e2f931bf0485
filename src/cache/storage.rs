// src/cache/storage.rs
// =============================================================================
// Raw string key-value stores that the cache sits on top of.
//
// The cache does not care where bytes live. It needs four calls:
// get_item, set_item, remove_item and keys. Two backends implement them:
// - FileStorage: one JSON object on disk, survives restarts
// - MemoryStorage: a HashMap for --no-persist and for tests
//
// A store may hold keys that do not belong to us (another tool sharing
// the file). The cache namespaces its own keys and never touches others.
//
// Rust concepts:
// - Trait objects: Box<dyn Storage> picked at runtime
// - Mutex: Interior mutability so every method can take &self
// =============================================================================

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

// A string -> string store
//
// Methods take &self so one store can be shared between tasks.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

fn lock(items: &Mutex<HashMap<String, String>>) -> Result<MutexGuard<'_, HashMap<String, String>>> {
    items
        .lock()
        .map_err(|_| anyhow!("storage lock poisoned"))
}

// In-process store; forgotten when the program exits
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.items)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.items)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        lock(&self.items)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(lock(&self.items)?.keys().cloned().collect())
    }
}

// Store backed by a single JSON file
//
// Every change re-reads the file, applies itself on top and rewrites it
// through a temporary file, so another process writing the same cache in
// between keeps its entries. Entries are small (one profile or one page of
// ten repositories), so a full rewrite is cheap enough.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    // Opens (or lazily creates) the store at `path`
    //
    // A missing file is an empty store. A corrupted file is also treated
    // as empty and is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = read_items(&path)?;
        debug!(path = %path.display(), entries = items.len(), "opened cache file");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    // Applies `change` to the latest file contents and persists the result
    //
    // `change` returns false when it left the map untouched; nothing is
    // written then, but the in-memory view still picks up the file.
    fn update(&self, change: impl FnOnce(&mut HashMap<String, String>) -> bool) -> Result<()> {
        let mut items = lock(&self.items)?;
        let mut latest = read_items(&self.path)?;
        if change(&mut latest) {
            self.flush(&latest)?;
        }
        *items = latest;
        Ok(())
    }

    fn flush(&self, items: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string(items)?;
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, json)
            .with_context(|| format!("Failed to write cache file {}", staging.display()))?;
        std::fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace cache file {}", self.path.display()))
    }
}

// Reads the whole map from `path`; missing or corrupted files are empty
fn read_items(path: &Path) -> Result<HashMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<HashMap<String, String>>(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cache file is corrupted; starting empty");
                Ok(HashMap::new())
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(e) => Err(e).with_context(|| format!("Failed to read cache file {}", path.display())),
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.items)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|items| items.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(lock(&self.items)?.keys().cloned().collect())
    }
}
