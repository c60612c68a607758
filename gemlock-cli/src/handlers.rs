use chrono::{DateTime, Utc};
use serde::Serialize;

use gemlock_core::types::LockRecord;

// ─── Identity ───────────────────────────────────────────────────────────────

/// Verified caller identity, extracted from the forwarded-auth headers by
/// the identity middleware. The lock subsystem trusts both values verbatim.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    /// Opaque subject, e.g. an email address.
    pub subject: String,
    /// Display label, for UI only.
    pub name: String,
}

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Serialize)]
pub struct AcquiredResponse {
    pub resource: String,
    #[serde(flatten)]
    pub record: LockRecord,
}

#[derive(Serialize)]
pub struct ConflictResponse {
    pub resource: String,
    pub owner: String,
    pub owner_name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_locks: usize,
    pub version: String,
}
