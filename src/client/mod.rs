//! Client side of the game: the card state synchronizer and its collaborators.

pub mod api;
pub mod errors;
pub mod order;
pub mod storage;
pub mod sync;

use std::sync::Arc;

pub use api::{ApiError, CardsApi, HttpCardsApi};
pub use errors::{ErrorLog, ErrorReporter, LogReporter};
pub use order::{RoundOutcome, TargetOrder, Verdict, EXODIA_ORDER};
pub use storage::{FileStorage, LocalStore, MemoryStorage, Persistence, StorageError};
pub use sync::{CardsService, CardsSnapshot, SyncError, SyncOptions};

use crate::config::ClientConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Service over HTTP and a state file, both taken from `config`. Errors are
/// reported to `errors`; call [`CardsService::bootstrap`] next.
pub fn connect(config: &ClientConfig, errors: Arc<dyn ErrorReporter>) -> Result<CardsService, ConnectError> {
    let api = HttpCardsApi::from_config(config)?;
    let storage = FileStorage::open(&config.state_file)?;
    Ok(CardsService::new(Arc::new(api), Arc::new(storage), errors, SyncOptions::from(config)))
}
