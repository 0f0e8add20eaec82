//! Catalog and selection files: whole-file JSON reads and writes.

use std::path::{Path, PathBuf};

use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use crate::model::{contains_id, Card};

pub const CATALOG_FILE: &str = "exodia-parts.json";
pub const SELECTION_FILE: &str = "user-cards.json";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("card not found: {0}")]
    UnknownCard(String),
    #[error("failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("malformed card file {}: {source}", .path.display())]
    Json { path: PathBuf, #[source] source: serde_json::Error },
}

/// File-backed card store. The catalog is only ever read; the selection file
/// is rewritten wholesale by every mutation.
#[derive(Debug)]
pub struct CardStore {
    catalog_path: PathBuf,
    selection_path: PathBuf,
    // Serializes read-modify-write of the selection file within this process.
    selection_lock: Mutex<()>,
}

impl CardStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            catalog_path: dir.join(CATALOG_FILE),
            selection_path: dir.join(SELECTION_FILE),
            selection_lock: Mutex::new(()),
        }
    }

    pub async fn catalog(&self) -> Result<Vec<Card>, StoreError> {
        read_cards(&self.catalog_path).await
    }

    /// Current selection. A missing selection file reads as empty.
    pub async fn selection(&self) -> Result<Vec<Card>, StoreError> {
        let _guard = self.selection_lock.lock().await;
        self.read_selection().await
    }

    /// Append the catalog card `card_id` to the selection unless it is already there.
    pub async fn add(&self, card_id: &str) -> Result<Vec<Card>, StoreError> {
        let catalog = self.catalog().await?;
        let card = catalog
            .into_iter()
            .find(|c| c.id == card_id)
            .ok_or_else(|| StoreError::UnknownCard(card_id.to_string()))?;

        let _guard = self.selection_lock.lock().await;
        let mut selection = self.read_selection().await?;
        if !contains_id(&selection, &card.id) {
            debug!(card_id, "adding card to selection");
            selection.push(card);
        }
        self.write_selection(&selection).await?;
        Ok(selection)
    }

    /// Drop `card_id` from the selection. Absent ids leave it unchanged.
    pub async fn remove(&self, card_id: &str) -> Result<Vec<Card>, StoreError> {
        let _guard = self.selection_lock.lock().await;
        let mut selection = self.read_selection().await?;
        match selection.iter().position(|c| c.id == card_id) {
            Some(index) => {
                debug!(card_id, "removing card from selection");
                selection.remove(index);
            }
            None => warn!(card_id, "remove requested for card not in selection"),
        }
        self.write_selection(&selection).await?;
        Ok(selection)
    }

    /// Clear the selection file and hand back the full catalog.
    pub async fn reset(&self) -> Result<Vec<Card>, StoreError> {
        let catalog = self.catalog().await?;
        let _guard = self.selection_lock.lock().await;
        self.write_selection(&[]).await?;
        Ok(catalog)
    }

    async fn read_selection(&self) -> Result<Vec<Card>, StoreError> {
        match fs::try_exists(&self.selection_path).await {
            Ok(false) => Ok(Vec::new()),
            _ => read_cards(&self.selection_path).await,
        }
    }

    async fn write_selection(&self, cards: &[Card]) -> Result<(), StoreError> {
        let path = &self.selection_path;
        let bytes = serde_json::to_vec(cards)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;
        fs::write(path, bytes)
            .await
            .map_err(|source| StoreError::Io { path: path.clone(), source })
    }
}

async fn read_cards(path: &Path) -> Result<Vec<Card>, StoreError> {
    let raw = fs::read(path)
        .await
        .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_slice(&raw).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
}
