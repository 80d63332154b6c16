//! HTTP boundary.
//!
//! A thin axum layer over the search core and the audit reports.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness probe |
//! | `GET`  | `/status` | Source connectivity report |
//! | `POST` | `/search` | Search both sources, audit-log the query |
//! | `GET`  | `/admin/stats` | Audit counters (API key required) |
//! | `GET`  | `/admin/history` | Recent audit entries (API key required) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `forbidden` (403), `not_found` (404).
//! An empty query or email is rejected here, before the core runs; zero
//! merged results is reported as `not_found` by this layer — the core itself
//! just returns an empty sequence. The admin endpoints expect the configured
//! key in the `X-API-Key` header.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted: the service fronts a
//! single-page frontend served from a different origin.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::cache::SheetCache;
use crate::config::Config;
use crate::models::{AuditEntry, SearchHit, Stats};
use crate::sheets::{self, SheetSource};
use crate::{audit, db, search, status};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    pool: PgPool,
    sheets: Option<Arc<dyn SheetSource>>,
    cache: Arc<SheetCache>,
}

/// Starts the HTTP server on `[server].bind`. Runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;
    let sheets = sheets::open_source(&config.sheets);
    let cache = Arc::new(SheetCache::new(
        config.sheets.cache_capacity,
        std::time::Duration::from_secs(config.sheets.cache_ttl_secs),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
        sheets,
        cache,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/status", get(handle_status))
        .route("/search", post(handle_search))
        .route("/admin/stats", get(handle_admin_stats))
        .route("/admin/history", get(handle_admin_history))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %bind_addr, "listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn forbidden(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::FORBIDDEN,
        code: "forbidden".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Checks the `X-API-Key` header against the configured admin key.
fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = &state.config.server.admin_api_key;
    if expected.is_empty() {
        return Err(forbidden("admin API key is not configured"));
    }
    match headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        Some(provided) if provided == expected => Ok(()),
        _ => Err(forbidden("missing or invalid API key")),
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct RootResponse {
    status: String,
    version: String,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /status ============

async fn handle_status(State(state): State<AppState>) -> Json<status::StatusReport> {
    let report = status::check(&state.config, state.sheets.as_deref()).await;
    Json(report)
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    email: String,
}

async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    let query = request.query.trim();
    let email = request.email.trim();

    if query.is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    if email.is_empty() {
        return Err(bad_request("email must not be empty"));
    }

    let hits = search::run_search(
        &state.pool,
        state.sheets.as_deref(),
        state.cache.as_ref(),
        &state.config,
        query,
    )
    .await;

    // Audited before the not-found decision: zero-result searches are
    // recorded too.
    audit::log_search(&state.pool, query, email, &hits).await;

    if hits.is_empty() {
        return Err(not_found("no results for the query"));
    }

    Ok(Json(hits))
}

// ============ GET /admin/stats ============

async fn handle_admin_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Stats>, AppError> {
    require_api_key(&state, &headers)?;

    let stats = audit::get_stats(&state.pool)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(stats))
}

// ============ GET /admin/history ============

#[derive(Deserialize)]
struct HistoryParams {
    #[serde(default = "default_history_limit")]
    limit: i64,
}

fn default_history_limit() -> i64 {
    100
}

async fn handle_admin_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AuditEntry>>, AppError> {
    require_api_key(&state, &headers)?;

    let limit = params.limit.clamp(1, 1000);
    let entries = audit::get_history(&state.pool, limit)
        .await
        .map_err(|e| internal(e.to_string()))?;
    Ok(Json(entries))
}
