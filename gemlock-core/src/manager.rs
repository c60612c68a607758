//! The lock state machine: Unlocked -> Locked -> Unlocked, per resource
//! key, with no other states. The manager is the sole writer of the table
//! and persists every mutation before returning, so a crash after a
//! successful return can never lose a lock.

use chrono::{DateTime, Duration, Utc};

use crate::expiry::ExpiryPolicy;
use crate::store::{LockStore, StoreError};
use crate::store_memory::MemoryLockStore;
use crate::types::{AcquireOutcome, LockRecord, LockTable, ReleaseOutcome};

/// Manager tunables.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Fixed lifetime of every lock. There is no per-call override.
    pub lock_duration: Duration,
    /// Whether the current owner may re-acquire its own valid lock,
    /// restarting the clock, instead of receiving a conflict.
    pub allow_self_refresh: bool,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_duration: Duration::minutes(30),
            allow_self_refresh: true,
        }
    }
}

/// The lock manager. Owns the in-memory table and its persistence backend.
///
/// Every mutating operation stages its changes on a copy of the table,
/// saves the copy, and only then commits it in memory, so a failed save
/// leaves both views exactly where they were.
pub struct LockManager {
    table: LockTable,
    store: Box<dyn LockStore>,
    config: LockConfig,
}

impl LockManager {
    /// In-memory manager. Locks do not survive the process.
    pub fn new(config: LockConfig) -> Self {
        Self::with_store(Box::new(MemoryLockStore::new()), config)
    }

    /// Manager over a persistence backend. Reloads the table at startup;
    /// missing or corrupt state comes back as an empty table.
    pub fn with_store(store: Box<dyn LockStore>, config: LockConfig) -> Self {
        let table = store.load();
        Self {
            table,
            store,
            config,
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Try to take the lock on `resource` for `owner`.
    pub fn acquire(
        &mut self,
        resource: &str,
        owner: &str,
        owner_name: &str,
    ) -> Result<AcquireOutcome, StoreError> {
        self.acquire_at(resource, owner, owner_name, Utc::now())
    }

    pub fn acquire_at(
        &mut self,
        resource: &str,
        owner: &str,
        owner_name: &str,
        now: DateTime<Utc>,
    ) -> Result<AcquireOutcome, StoreError> {
        let mut next = self.table.clone();

        // Lazy sweep: expired records anywhere in the table are dropped as
        // part of this acquire, and the removals persist even when the
        // acquire itself is denied.
        next.retain(|_, record| ExpiryPolicy::is_valid(record, now));

        if let Some(existing) = next.get(resource) {
            let refreshing = existing.owner == owner && self.config.allow_self_refresh;
            if !refreshing {
                let outcome = AcquireOutcome::Conflict {
                    owner: existing.owner.clone(),
                    owner_name: existing.owner_name.clone(),
                    expires_at: existing.expires_at,
                };
                self.commit(next)?;
                return Ok(outcome);
            }
        }

        let record = LockRecord::new(owner, owner_name, now, self.config.lock_duration);
        next.insert(resource.to_string(), record.clone());
        self.commit(next)?;
        Ok(AcquireOutcome::Acquired(record))
    }

    /// Release the lock on `resource` held by `owner`.
    pub fn release(&mut self, resource: &str, owner: &str) -> Result<ReleaseOutcome, StoreError> {
        self.release_at(resource, owner, Utc::now())
    }

    pub fn release_at(
        &mut self,
        resource: &str,
        owner: &str,
        now: DateTime<Utc>,
    ) -> Result<ReleaseOutcome, StoreError> {
        let mut next = self.table.clone();

        // Resolve the target key before sweeping: deleting an expired
        // record is harmless cleanup whoever asks, since it is logically
        // already gone. Only a valid record is owner-guarded.
        let outcome = match next.get(resource) {
            None => ReleaseOutcome::NotFound,
            Some(existing) if ExpiryPolicy::is_valid(existing, now) && existing.owner != owner => {
                ReleaseOutcome::Forbidden {
                    owner: existing.owner.clone(),
                }
            }
            Some(_) => ReleaseOutcome::Released,
        };
        if outcome == ReleaseOutcome::Released {
            next.remove(resource);
        }

        // Expired records elsewhere in the table ride along.
        next.retain(|_, record| ExpiryPolicy::is_valid(record, now));
        self.commit(next)?;
        Ok(outcome)
    }

    /// Drop every expired record. Returns how many were removed; persists
    /// only if anything changed.
    pub fn sweep_expired(&mut self) -> Result<usize, StoreError> {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&mut self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut next = self.table.clone();
        next.retain(|_, record| ExpiryPolicy::is_valid(record, now));
        let removed = self.table.len() - next.len();
        self.commit(next)?;
        Ok(removed)
    }

    /// Snapshot of all currently valid locks. Runs the sweep first, so a
    /// list operation may shrink the store.
    pub fn list_valid(&mut self) -> Result<LockTable, StoreError> {
        self.list_valid_at(Utc::now())
    }

    pub fn list_valid_at(&mut self, now: DateTime<Utc>) -> Result<LockTable, StoreError> {
        self.sweep_expired_at(now)?;
        Ok(self.table.clone())
    }

    /// Count of valid locks without sweeping. Cheap read for health checks.
    pub fn valid_count(&self) -> usize {
        self.valid_count_at(Utc::now())
    }

    pub fn valid_count_at(&self, now: DateTime<Utc>) -> usize {
        self.table
            .values()
            .filter(|record| ExpiryPolicy::is_valid(record, now))
            .count()
    }

    /// Persist `next` and make it the committed table. Skips the write when
    /// nothing changed, so pure conflict checks cost no I/O.
    fn commit(&mut self, next: LockTable) -> Result<(), StoreError> {
        if next != self.table {
            self.store.save(&next)?;
            self.table = next;
        }
        Ok(())
    }
}
