#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use tempfile::TempDir;

    use crate::manager::{LockConfig, LockManager};
    use crate::store::LockStore;
    use crate::store_file::FileLockStore;
    use crate::store_memory::MemoryLockStore;
    use crate::types::{AcquireOutcome, LockRecord, LockTable};

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    fn sample_table() -> LockTable {
        let mut table = LockTable::new();
        table.insert(
            "5star/starfire_shard".to_string(),
            LockRecord::new("alice@example.com", "Alice", noon(), Duration::minutes(30)),
        );
        table.insert(
            "2star/power_and_command".to_string(),
            LockRecord::new("bob@example.com", "Bob", noon(), Duration::minutes(30)),
        );
        table
    }

    #[test]
    fn missing_file_loads_as_empty_table() {
        let dir = TempDir::new().unwrap();
        let store = FileLockStore::new(dir.path().join("locks.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_file_loads_as_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locks.json");
        fs::write(&path, "{ not json").unwrap();

        let store = FileLockStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn wrong_shape_loads_as_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locks.json");
        // Valid JSON, but records are missing required fields.
        fs::write(&path, r#"{"5star/starfire_shard": {"owner": "alice@example.com"}}"#).unwrap();

        let store = FileLockStore::new(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let mut store = FileLockStore::new(dir.path().join("locks.json"));

        let table = sample_table();
        store.save(&table).unwrap();
        assert_eq!(store.load(), table);
    }

    #[test]
    fn serialization_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locks.json");
        let mut store = FileLockStore::new(&path);

        store.save(&sample_table()).unwrap();
        let first = fs::read_to_string(&path).unwrap();

        let reloaded = store.load();
        store.save(&reloaded).unwrap();
        let second = fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("locks.json");
        let mut store = FileLockStore::new(&path);

        store.save(&sample_table()).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let mut store = FileLockStore::new(dir.path().join("locks.json"));
        store.save(&sample_table()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["locks.json".to_string()]);
    }

    #[test]
    fn memory_store_never_persists() {
        let mut store = MemoryLockStore::new();
        store.save(&sample_table()).unwrap();
        assert!(store.load().is_empty());
    }

    /// Crash safety: the save happens before acquire returns, so a fresh
    /// process reading the same file sees the lock.
    #[test]
    fn restarted_manager_sees_persisted_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locks.json");
        let config = LockConfig {
            lock_duration: Duration::minutes(30),
            allow_self_refresh: true,
        };
        let t0 = noon();

        let mut manager =
            LockManager::with_store(Box::new(FileLockStore::new(&path)), config.clone());
        manager
            .acquire_at("5star/starfire_shard", "alice@example.com", "Alice", t0)
            .unwrap();
        drop(manager);

        let mut restarted = LockManager::with_store(Box::new(FileLockStore::new(&path)), config);
        let listed = restarted.list_valid_at(t0 + Duration::minutes(1)).unwrap();
        assert!(listed.contains_key("5star/starfire_shard"));

        let denied = restarted
            .acquire_at(
                "5star/starfire_shard",
                "bob@example.com",
                "Bob",
                t0 + Duration::minutes(1),
            )
            .unwrap();
        assert!(matches!(
            denied,
            AcquireOutcome::Conflict { owner, .. } if owner == "alice@example.com"
        ));
    }

    #[test]
    fn release_persists_the_removal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("locks.json");
        let config = LockConfig::default();
        let t0 = noon();

        let mut manager =
            LockManager::with_store(Box::new(FileLockStore::new(&path)), config.clone());
        manager
            .acquire_at("5star/starfire_shard", "alice@example.com", "Alice", t0)
            .unwrap();
        manager
            .release_at("5star/starfire_shard", "alice@example.com", t0)
            .unwrap();
        drop(manager);

        let restarted = FileLockStore::new(&path);
        assert!(restarted.load().is_empty());
    }
}
