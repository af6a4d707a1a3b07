//! HTTP API server.
//!
//! Exposes overlap checking as a JSON HTTP API for editors, review tools
//! and browser clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/check` | Check a text; returns matches and per-source summary |
//! | `POST` | `/corpus/reload` | Re-read the corpus and swap in a fresh index |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "text exceeds 1000000 bytes" } }
//! ```
//!
//! Error codes: `bad_request` (400), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sourcecheck_core::DetectionResult;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

use crate::check::{CheckRequest, Checker};
use crate::config::Config;

/// Smallest request body accepted regardless of `server.max_text_bytes`.
const MIN_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    checker: Arc<Checker>,
    max_text_bytes: usize,
}

/// Start the HTTP server on `server.bind`.
///
/// The corpus is indexed before the listener opens so the first request
/// does not pay for it.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let checker = Arc::new(Checker::from_config(config)?);

    let warm = checker.clone();
    let index = tokio::task::spawn_blocking(move || warm.corpus()).await??;
    info!(
        sources = index.source_count(),
        shingles = index.shingle_count(),
        "corpus ready"
    );

    let app = router(checker, config.server.max_text_bytes);

    let bind_addr = &config.server.bind;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, "server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// The API router over an existing checker.
pub fn router(checker: Arc<Checker>, max_text_bytes: usize) -> Router {
    let state = AppState {
        checker,
        max_text_bytes,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/check", post(handle_check))
        .route("/corpus/reload", post(handle_reload))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(
            max_text_bytes.saturating_mul(4).max(MIN_BODY_LIMIT),
        ))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"internal"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
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

fn internal(err: anyhow::Error) -> AppError {
    let message = format!("{:#}", err);
    error!(error = %message, "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message,
    }
}

// ============ POST /check ============

async fn handle_check(
    State(state): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<DetectionResult>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    if request.text.trim().is_empty() {
        debug!("empty text, nothing to check");
        return Ok(Json(DetectionResult::default()));
    }
    if request.text.len() > state.max_text_bytes {
        return Err(bad_request(format!(
            "text exceeds {} bytes",
            state.max_text_bytes
        )));
    }

    let result = state.checker.check(&request).await.map_err(internal)?;
    Ok(Json(result))
}

// ============ POST /corpus/reload ============

#[derive(Serialize)]
struct ReloadResponse {
    sources: usize,
    shingles: usize,
    generation: u64,
}

/// Handler for `POST /corpus/reload`.
///
/// Requests in flight keep the index they started with.
async fn handle_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let checker = state.checker.clone();
    let index = tokio::task::spawn_blocking(move || checker.reload_corpus())
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(internal)?;
    Ok(Json(ReloadResponse {
        sources: index.source_count(),
        shingles: index.shingle_count(),
        generation: index.generation,
    }))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
