//! Read-only view of the gem data tree.
//!
//! The lock service only needs to know which gems exist; reading and
//! validating gem JSON belongs to the editor backend.

use std::fs;
use std::path::{Component, Path, PathBuf};

/// Resolves resource keys like `5star/starfire_shard` against a data
/// directory laid out as `<data_dir>/<N>star/<gem>.json`.
#[derive(Clone)]
pub struct GemCatalog {
    data_dir: PathBuf,
}

impl GemCatalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// True when `key` names an existing gem file under the data tree.
    pub fn exists(&self, key: &str) -> bool {
        match self.gem_path(key) {
            Some(path) => path.is_file(),
            None => false,
        }
    }

    /// All known resource keys, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(_) => return keys,
        };

        for entry in entries.flatten() {
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            if !entry.path().is_dir() || !dir_name.ends_with("star") {
                continue;
            }
            let gems = match fs::read_dir(entry.path()) {
                Ok(gems) => gems,
                Err(_) => continue,
            };
            for gem in gems.flatten() {
                let path = gem.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    keys.push(format!("{}/{}", dir_name, stem));
                }
            }
        }

        keys.sort();
        keys
    }

    /// Resolve a key to its JSON file. Keys are opaque to the lock
    /// subsystem, but they are used as relative paths here, so anything
    /// that could escape the data tree is rejected.
    fn gem_path(&self, key: &str) -> Option<PathBuf> {
        if key.is_empty() {
            return None;
        }
        for component in Path::new(key).components() {
            match component {
                Component::Normal(_) => {}
                _ => return None,
            }
        }
        Some(self.data_dir.join(format!("{}.json", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_with_gems() -> (TempDir, GemCatalog) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("5star")).unwrap();
        fs::create_dir(dir.path().join("1star")).unwrap();
        fs::write(dir.path().join("5star/starfire_shard.json"), "{}").unwrap();
        fs::write(dir.path().join("1star/everlasting_torment.json"), "{}").unwrap();
        fs::write(dir.path().join("5star/notes.txt"), "ignored").unwrap();
        let catalog = GemCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn existing_gem_is_found() {
        let (_dir, catalog) = catalog_with_gems();
        assert!(catalog.exists("5star/starfire_shard"));
        assert!(!catalog.exists("5star/unknown_gem"));
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let (_dir, catalog) = catalog_with_gems();
        assert!(!catalog.exists("../5star/starfire_shard"));
        assert!(!catalog.exists("/etc/passwd"));
        assert!(!catalog.exists(""));
    }

    #[test]
    fn list_returns_sorted_json_keys_only() {
        let (_dir, catalog) = catalog_with_gems();
        assert_eq!(
            catalog.list(),
            vec![
                "1star/everlasting_torment".to_string(),
                "5star/starfire_shard".to_string(),
            ]
        );
    }

    #[test]
    fn missing_data_dir_lists_nothing() {
        let catalog = GemCatalog::new("/nonexistent/gemlock-data");
        assert!(catalog.list().is_empty());
    }
}
