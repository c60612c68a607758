use chrono::{DateTime, Utc};

use crate::types::LockRecord;

/// Pure staleness check shared by every entry point.
///
/// Acquire, release, and the query surface all go through this, so
/// "expired" means exactly one thing across the subsystem.
pub struct ExpiryPolicy;

impl ExpiryPolicy {
    /// A record is valid while `now` is strictly before its expiry.
    /// At `now == expires_at` the record is already void.
    pub fn is_valid(record: &LockRecord, now: DateTime<Utc>) -> bool {
        now < record.expires_at
    }
}
