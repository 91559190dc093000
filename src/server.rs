//! HTTP host for the import pipeline and the search engine.
//!
//! Lets a browser front end drive imports and searches without talking to
//! the record store directly. The store itself stays behind
//! [`RecordStore`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/fields?entity=..` | Filterable fields for the given scopes |
//! | `POST` | `/import` | Import CSV text into a forum, returns the full log |
//! | `GET`  | `/search?query=..&entity=..&filter=..&tab=..` | Cross-entity search view |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "destination_id must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `store_unavailable` (502).
//! A failed store call is never reported as an empty result.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use intel_harness_core::import::{run_import, ImportOptions, ImportSummary, LineNumbering};
use intel_harness_core::registry::FieldDescriptor;
use intel_harness_core::store::{RecordStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::fields::filterable;
use crate::http_store::HttpRecordStore;
use crate::query_params::from_query;
use crate::search_cmd::build_view;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

/// Builds the router with all routes and CORS attached.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/fields", get(handle_fields))
        .route("/import", post(handle_import))
        .route("/search", get(handle_search))
        .layer(cors)
        .with_state(state)
}

/// Starts the server on `[server].bind`, backed by the configured HTTP
/// record store. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = HttpRecordStore::from_config(config)?;
    let bind_addr = config.server.bind.clone();
    let state = AppState::new(config.clone(), Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        bind = %bind_addr,
        store = %config.store.base_url,
        "server listening"
    );
    println!("Listening on http://{}", bind_addr);

    axum::serve(listener, router(state)).await?;

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

fn store_unavailable(err: StoreError) -> AppError {
    tracing::warn!(error = %err, "record store call failed");
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "store_unavailable".to_string(),
        message: err.to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /fields ============

#[derive(Deserialize)]
struct FieldsParams {
    entity: Option<String>,
}

#[derive(Serialize)]
struct FieldsResponse {
    fields: Vec<&'static FieldDescriptor>,
}

async fn handle_fields(Query(params): Query<FieldsParams>) -> Json<FieldsResponse> {
    Json(FieldsResponse {
        fields: filterable(params.entity.as_deref()),
    })
}

// ============ POST /import ============

#[derive(Deserialize)]
struct ImportRequest {
    destination_id: String,
    csv: String,
    #[serde(default)]
    line_numbering: Option<LineNumbering>,
}

#[derive(Serialize)]
struct ImportResponse {
    log: Vec<intel_harness_core::import::ImportLogEntry>,
    summary: ImportSummary,
}

/// Runs the whole import before answering. Per-line failures are part of
/// a 200 response; only a missing destination is a client error.
async fn handle_import(
    State(state): State<AppState>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let destination = req.destination_id.trim();
    if destination.is_empty() {
        return Err(bad_request("destination_id must not be empty"));
    }

    let options = ImportOptions {
        numbering: req
            .line_numbering
            .unwrap_or(state.config.import.line_numbering),
    };
    let log = run_import(&req.csv, destination, state.store.as_ref(), options).await;
    let summary = ImportSummary::from_log(&log);
    tracing::info!(
        destination,
        imported = summary.imported,
        failed = summary.failed,
        "import request finished"
    );

    Ok(Json(ImportResponse { log, summary }))
}

// ============ GET /search ============

async fn handle_search(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, AppError> {
    let params = from_query(raw.as_deref().unwrap_or("")).map_err(|e| bad_request(e.to_string()))?;

    let results = state
        .store
        .search(&params.request)
        .await
        .map_err(store_unavailable)?;

    let view = build_view(
        &results,
        &params.request,
        params.tab.as_deref(),
        state.config.search.date_basis,
    );
    Ok(Json(view).into_response())
}
