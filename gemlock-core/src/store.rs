use std::path::PathBuf;

use thiserror::Error;

use crate::types::LockTable;

/// Persistence failures. Only writes can fail a mutation: an unpersisted
/// "success" would leave the in-memory and durable views disagreeing after
/// a crash, so save errors abort the operation and surface to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write lock file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize lock table: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Contract for lock table persistence backends.
///
/// The manager re-saves the full table after every mutation; there are no
/// partial-key operations at this layer. Write amplification is the price
/// for eliminating lost-update bugs on the persisted copy.
pub trait LockStore: Send {
    /// Read the persisted table. Missing or unreadable state loads as an
    /// empty table; corruption is recovered here and logged, never
    /// propagated to a caller.
    fn load(&self) -> LockTable;

    /// Persist the full table. Must never expose a partially written file
    /// to a concurrent reader.
    fn save(&mut self, table: &LockTable) -> Result<(), StoreError>;
}
