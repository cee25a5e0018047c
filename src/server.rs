//! HTTP API.
//!
//! Exposes the question pipeline to web clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ask` | Answer a student question against the stored material |
//! | `POST` | `/save_user` | Accept a user profile and echo it back |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `upstream_error` (502),
//! `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser-based course
//! frontends can call the API cross-origin.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::answer;
use crate::ask::{answer_question, AskError, AskRequest, AskResponse};
use crate::config::Config;
use crate::store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
struct AppState {
    /// Application configuration (wrapped in `Arc` for cheap cloning across handlers).
    config: Arc<Config>,
    /// Materials store over a shared connection pool.
    store: SqliteStore,
}

/// Starts the HTTP server.
///
/// Binds to the address configured in `[server].bind` and registers all
/// route handlers. The server runs indefinitely until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    // Fail fast on a misconfigured provider (missing model or API key)
    // instead of surfacing it on the first request.
    if config.answer.is_enabled() {
        let provider = answer::create_provider(&config.answer)?;
        println!(
            "answer provider: {} ({})",
            provider.provider_name(),
            provider.model_name()
        );
        if let Some(fallback) = config.answer.fallback() {
            let provider = answer::create_provider(&fallback)?;
            println!(
                "fallback provider: {} ({})",
                provider.provider_name(),
                provider.model_name()
            );
        }
    }

    let state = AppState {
        config: Arc::new(config.clone()),
        store: SqliteStore::open(config).await?,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ask", post(handle_ask))
        .route("/save_user", post(handle_save_user))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("madrasa server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
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

impl From<AskError> for AppError {
    fn from(err: AskError) -> Self {
        let (status, code) = match &err {
            AskError::InvalidRequest(_) | AskError::InvalidLanguage(_) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            AskError::MaterialNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AskError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            AskError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

// ============ POST /ask ============

/// Handler for `POST /ask`.
///
/// Runs the question pipeline: fetch the material for the requested level
/// and week, ask the configured provider, and render the answer in the
/// requested target script.
async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let response = answer_question(&state.config, &state.store, &request).await?;
    Ok(Json(response))
}

// ============ POST /save_user ============

/// Handler for `POST /save_user`.
///
/// Accepts an arbitrary JSON user profile and echoes it back. Persistence is
/// the frontend's concern; the endpoint exists so course clients have a
/// stable place to post profile updates.
async fn handle_save_user(Json(profile): Json<serde_json::Value>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "User data received!",
        "data": profile,
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

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
