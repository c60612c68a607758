use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One outstanding claim on an editable resource.
///
/// The resource key is the table's key, not a record field, matching the
/// persisted `resource_key -> record` layout. Records are never updated in
/// place: they are deleted (release, expiry) or replaced whole (re-acquire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Verified subject holding the lock.
    pub owner: String,
    /// Human-readable label for UI purposes only. Never consulted for
    /// authorization.
    pub owner_name: String,
    /// When the lock was acquired.
    pub acquired_at: DateTime<Utc>,
    /// `acquired_at + lock_duration`. Always strictly later than
    /// `acquired_at`.
    pub expires_at: DateTime<Utc>,
}

impl LockRecord {
    pub fn new(
        owner: impl Into<String>,
        owner_name: impl Into<String>,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            owner: owner.into(),
            owner_name: owner_name.into(),
            acquired_at: now,
            expires_at: now + duration,
        }
    }
}

/// The full lock table, `resource_key -> record`.
///
/// A `BTreeMap` keeps the keys sorted, so serializing the same table twice
/// produces identical bytes.
pub type LockTable = BTreeMap<String, LockRecord>;
