use chrono::{DateTime, Utc};

use super::LockRecord;

/// Result of attempting to acquire a lock. Terminal outcomes; the manager
/// never blocks, queues, or retries on behalf of the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller now holds the lock.
    Acquired(LockRecord),
    /// A still-valid lock is held by someone else. The caller learns who
    /// holds it and when it frees up.
    Conflict {
        owner: String,
        owner_name: String,
        expires_at: DateTime<Utc>,
    },
}

/// Result of attempting to release a lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The record was deleted.
    Released,
    /// No record exists for the key, valid or expired.
    NotFound,
    /// A valid record exists and belongs to someone else.
    Forbidden { owner: String },
}
