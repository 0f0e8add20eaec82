//! Local persisted copy of the two card pools, behind a key/value port.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::model::Card;

pub const AVAILABLE_KEY: &str = "availableCardsData";
pub const SELECTED_KEY: &str = "userCardsData";
pub const RESET_REQUIRED_KEY: &str = "appResetRequired";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed state file {}: {source}", .path.display())]
    Json { path: PathBuf, #[source] source: serde_json::Error },
}

/// String key/value storage, the shape of browser local storage.
pub trait Persistence: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }
}

impl Persistence for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// All keys in one JSON object file, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .map_err(|source| StorageError::Io { path: path.clone(), source })?;
            serde_json::from_str(&raw).map_err(|source| StorageError::Json { path: path.clone(), source })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| StorageError::Io { path: parent.to_path_buf(), source })?;
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|source| StorageError::Json { path: self.path.clone(), source })?;
        std::fs::write(&self.path, raw).map_err(|source| StorageError::Io { path: self.path.clone(), source })
    }
}

impl Persistence for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

/// Pools recovered from storage. `None` means nothing usable was stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoredPools {
    pub available: Option<Vec<Card>>,
    pub selected: Option<Vec<Card>>,
}

/// Typed access to the persisted pools and the reset flag. Failures are
/// logged and swallowed: the persisted copy is a cache, never the authority.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn Persistence>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn Persistence>) -> Self { Self { backend } }

    pub fn restore(&self) -> RestoredPools {
        RestoredPools { available: self.load_cards(AVAILABLE_KEY), selected: self.load_cards(SELECTED_KEY) }
    }

    pub fn persist(&self, available: &[Card], selected: &[Card]) {
        self.save_cards(SELECTED_KEY, selected);
        self.save_cards(AVAILABLE_KEY, available);
    }

    pub fn reset_required(&self) -> bool {
        matches!(self.backend.load(RESET_REQUIRED_KEY), Ok(Some(v)) if v == "true")
    }

    pub fn set_reset_required(&self, required: bool) {
        let result = if required {
            self.backend.save(RESET_REQUIRED_KEY, "true")
        } else {
            self.backend.remove(RESET_REQUIRED_KEY)
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to persist reset flag");
        }
    }

    fn load_cards(&self, key: &str) -> Option<Vec<Card>> {
        let raw = match self.backend.load(key) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key, error = %err, "failed to read persisted cards");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(cards) => Some(cards),
            Err(err) => {
                warn!(key, error = %err, "ignoring malformed persisted cards");
                None
            }
        }
    }

    fn save_cards(&self, key: &str, cards: &[Card]) {
        let result = serde_json::to_string(cards)
            .map_err(|err| err.to_string())
            .and_then(|raw| self.backend.save(key, &raw).map_err(|err| err.to_string()));
        if let Err(error) = result {
            warn!(key, %error, "failed to persist cards");
        }
    }
}
