use crate::store::{LockStore, StoreError};
use crate::types::LockTable;

/// The non-persisted variant: locks live only as long as the process.
///
/// Used for dev mode and tests. Loads empty, saves nowhere.
#[derive(Debug, Default)]
pub struct MemoryLockStore;

impl MemoryLockStore {
    pub fn new() -> Self {
        Self
    }
}

impl LockStore for MemoryLockStore {
    fn load(&self) -> LockTable {
        LockTable::new()
    }

    fn save(&mut self, _table: &LockTable) -> Result<(), StoreError> {
        Ok(())
    }
}
