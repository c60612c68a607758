//! JSON-file-backed lock store.
//!
//! The whole table lives in one file. Saves write to a hidden temp file in
//! the same directory, fsync, then rename over the target, so a concurrent
//! reader never observes a half-written table.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::store::{LockStore, StoreError};
use crate::types::LockTable;

pub struct FileLockStore {
    path: PathBuf,
}

impl FileLockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temp file lives next to the target so the rename stays on one
    /// filesystem (rename is only atomic within a single volume).
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("locks.json");
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn write_err(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl LockStore for FileLockStore {
    fn load(&self) -> LockTable {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return LockTable::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable lock file, starting with an empty table"
                );
                return LockTable::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "corrupt lock file, starting with an empty table"
                );
                LockTable::new()
            }
        }
    }

    fn save(&mut self, table: &LockTable) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(table)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| Self::write_err(parent, e))?;
        }

        let tmp = self.temp_path();
        let mut file = File::create(&tmp).map_err(|e| Self::write_err(&tmp, e))?;
        file.write_all(json.as_bytes()).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Self::write_err(&tmp, e)
        })?;
        file.sync_all().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Self::write_err(&tmp, e)
        })?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Self::write_err(&self.path, e)
        })?;

        Ok(())
    }
}
