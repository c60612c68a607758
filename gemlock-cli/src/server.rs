use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use tower_http::cors::CorsLayer;

use gemlock_core::manager::{LockConfig, LockManager};
use gemlock_core::store_file::FileLockStore;
use gemlock_core::types::{AcquireOutcome, LockTable, ReleaseOutcome};

use crate::catalog::GemCatalog;
use crate::handlers::*;

pub struct App {
    /// One mutex over the whole manager: every handler's
    /// read-modify-write-persist sequence is a single critical section,
    /// so acquires and releases on different keys cannot race on the
    /// shared lock file either.
    pub manager: Mutex<LockManager>,
    pub catalog: GemCatalog,
}

pub type AppState = Arc<App>;

pub async fn run(host: &str, port: u16, storage: &str, data_dir: PathBuf, config: LockConfig) {
    let manager = create_manager(storage, config);
    let loaded = manager.valid_count();
    if loaded > 0 {
        tracing::info!(locks = loaded, "Restored valid locks from storage");
    }

    let state: AppState = Arc::new(App {
        manager: Mutex::new(manager),
        catalog: GemCatalog::new(data_dir),
    });

    let app = Router::new()
        // Health is always open (no identity required)
        .route("/health", get(health))
        // Protected routes
        .route("/gems", get(list_gems))
        .route("/locks", get(list_locks))
        .route("/locks/{*resource}", post(acquire_lock))
        .route("/locks/{*resource}", delete(release_lock))
        .layer(middleware::from_fn(identity_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("{}:{}", host, port);

    tracing::info!("🔒 gemlock server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

// ─── Identity Middleware ────────────────────────────────────────────────────

/// Identity verification happens upstream (the auth proxy exchanges the
/// Google credential for a session and forwards the verified subject).
/// This middleware only lifts the forwarded headers into a `VerifiedUser`
/// and rejects requests that arrive without one.
async fn identity_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let subject = headers
        .get("x-verified-user")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_string();

    if subject.is_empty() {
        tracing::warn!(path = %request.uri().path(), "🚫 Request without verified identity");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let name = headers
        .get("x-verified-name")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&subject)
        .to_string();

    request.extensions_mut().insert(VerifiedUser { subject, name });
    Ok(next.run(request).await)
}

// ─── Handlers ───────────────────────────────────────────────────────────────

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let manager = state.manager.lock().await;
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        active_locks: manager.valid_count(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn list_gems(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::ok(state.catalog.list()))
}

async fn acquire_lock(
    State(state): State<AppState>,
    Extension(user): Extension<VerifiedUser>,
    Path(resource): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !state.catalog.exists(&resource) {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Unknown gem '{}'", resource),
            })),
        );
    }

    let mut manager = state.manager.lock().await;
    match manager.acquire(&resource, &user.subject, &user.name) {
        Ok(AcquireOutcome::Acquired(record)) => {
            tracing::info!(
                resource = %resource,
                owner = %user.subject,
                expires_at = %record.expires_at,
                "Lock acquired"
            );
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "success": true,
                    "data": AcquiredResponse { resource, record },
                })),
            )
        }
        Ok(AcquireOutcome::Conflict {
            owner,
            owner_name,
            expires_at,
        }) => {
            tracing::info!(
                resource = %resource,
                requested_by = %user.subject,
                held_by = %owner,
                "Lock denied"
            );
            (
                StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "success": false,
                    "error": format!("'{}' is being edited by {}", resource, owner_name),
                    "data": ConflictResponse { resource, owner, owner_name, expires_at },
                })),
            )
        }
        Err(e) => {
            tracing::error!(resource = %resource, error = %e, "Failed to persist lock table");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": "failed to persist lock state",
                })),
            )
        }
    }
}

async fn release_lock(
    State(state): State<AppState>,
    Extension(user): Extension<VerifiedUser>,
    Path(resource): Path<String>,
) -> (StatusCode, Json<ApiResponse<String>>) {
    let mut manager = state.manager.lock().await;
    match manager.release(&resource, &user.subject) {
        Ok(ReleaseOutcome::Released) => {
            tracing::info!(resource = %resource, owner = %user.subject, "Lock released");
            (
                StatusCode::OK,
                Json(ApiResponse::ok(format!("Lock on '{}' released", resource))),
            )
        }
        Ok(ReleaseOutcome::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::err(format!("No lock on '{}'", resource))),
        ),
        Ok(ReleaseOutcome::Forbidden { owner }) => {
            tracing::warn!(
                resource = %resource,
                requested_by = %user.subject,
                held_by = %owner,
                "Release refused"
            );
            (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::err(format!(
                    "Lock on '{}' is held by {}",
                    resource, owner
                ))),
            )
        }
        Err(e) => {
            tracing::error!(resource = %resource, error = %e, "Failed to persist lock table");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("failed to persist lock state")),
            )
        }
    }
}

async fn list_locks(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<LockTable>>) {
    let mut manager = state.manager.lock().await;
    // The sweep inside list_valid may shrink the store; a read that
    // writes is part of the lazy-expiry contract.
    match manager.list_valid() {
        Ok(table) => (StatusCode::OK, Json(ApiResponse::ok(table))),
        Err(e) => {
            tracing::error!(error = %e, "Failed to persist lock table");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("failed to persist lock state")),
            )
        }
    }
}

// ─── Storage Backend Selection ──────────────────────────────────────────────

fn create_manager(storage: &str, config: LockConfig) -> LockManager {
    if storage == "memory" {
        tracing::info!("💾 Storage backend: in-memory (locks will not survive a restart)");
        LockManager::new(config)
    } else if let Some(path) = storage.strip_prefix("file:") {
        tracing::info!("💾 Storage backend: lock file ({})", path);
        LockManager::with_store(Box::new(FileLockStore::new(path)), config)
    } else {
        tracing::error!(
            "Unknown storage backend: '{}'. Use 'memory' or 'file:<path>'",
            storage
        );
        tracing::warn!("Falling back to in-memory storage.");
        LockManager::new(config)
    }
}
