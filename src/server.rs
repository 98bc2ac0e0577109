//! Curation HTTP server.
//!
//! Exposes the three stage pipelines, the admin review queue, and the hub
//! export as a JSON HTTP API. The browser frontend and any scripted
//! collectors talk to the same endpoints.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/raw/submit` | Submit a raw document |
//! | `GET`  | `/api/raw/pending` | Pending raw submissions |
//! | `GET`  | `/api/raw/approved` | Approved raw documents |
//! | `GET`  | `/api/raw/file/{filename}` | One raw document, pending or approved |
//! | `GET`  | `/api/cleaning/raw-files` | Approved raw files with cleaning status |
//! | `POST` | `/api/cleaning/submit` | Submit a cleaned version |
//! | `GET`  | `/api/cleaning/pending` | Pending cleaned submissions |
//! | `GET`  | `/api/cleaning/approved` | Approved cleaned documents |
//! | `GET`  | `/api/cleaning/file/{filename}` | One cleaned document |
//! | `GET`  | `/api/chunking/cleaned-files` | Approved cleaned files with chunk counts |
//! | `POST` | `/api/chunking/submit` | Submit one chunk |
//! | `POST` | `/api/chunking/submit-batch` | Submit several chunks for one file |
//! | `GET`  | `/api/chunking/chunks/{filename}` | All chunks of a file |
//! | `GET`  | `/api/chunking/pending` | Pending chunks grouped by file |
//! | `DELETE` | `/api/chunking/chunk/{filename}/{index}` | Delete a pending chunk |
//! | `GET`  | `/api/admin/pending` | Full review queue |
//! | `GET`  | `/api/admin/pending/{type}/{filename}` | One pending item with content |
//! | `POST` | `/api/admin/approve` | Approve an item or chunk |
//! | `POST` | `/api/admin/reject` | Reject an item or chunk |
//! | `POST` | `/api/admin/edit` | Edit a pending item or chunk |
//! | `POST` | `/api/admin/approve-all` | Bulk approve a stage or a file's chunks |
//! | `GET`  | `/api/admin/stats` | Per-stage pending/approved counts |
//! | `POST` | `/api/admin/push-to-hf` | Push approved content to the hub |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Every failure returns `{ "success": false, "error": "<message>" }` with
//! a 400 for validation and configuration problems, 404 for missing items,
//! and 502 for remote hub failures.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the static frontend
//! can be served from anywhere.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::approval;
use crate::chunking::{self, BatchChunkEntry, ChunkSubmission};
use crate::cleaning;
use crate::config::Config;
use crate::error::Error;
use crate::export::{self, PushScope};
use crate::hub::{self, HfHubClient};
use crate::models::{ChunkRecord, ItemMeta, ItemStatus, Stage, StageTotals};
use crate::raw::{self, RawSubmission};
use crate::store::Store;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: Arc<Store>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<Store>) -> Self {
        Self { config, store }
    }
}

/// Build the full application router. Exposed so tests can bind their own
/// listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/raw/submit", post(handle_raw_submit))
        .route("/api/raw/pending", get(handle_raw_pending))
        .route("/api/raw/approved", get(handle_raw_approved))
        .route("/api/raw/file/{filename}", get(handle_raw_file))
        .route("/api/cleaning/raw-files", get(handle_cleaning_raw_files))
        .route("/api/cleaning/submit", post(handle_cleaning_submit))
        .route("/api/cleaning/pending", get(handle_cleaning_pending))
        .route("/api/cleaning/approved", get(handle_cleaning_approved))
        .route("/api/cleaning/file/{filename}", get(handle_cleaning_file))
        .route("/api/chunking/cleaned-files", get(handle_chunking_cleaned_files))
        .route("/api/chunking/submit", post(handle_chunking_submit))
        .route("/api/chunking/submit-batch", post(handle_chunking_submit_batch))
        .route("/api/chunking/chunks/{filename}", get(handle_chunking_chunks))
        .route("/api/chunking/pending", get(handle_chunking_pending))
        .route(
            "/api/chunking/chunk/{filename}/{index}",
            delete(handle_chunking_delete),
        )
        .route("/api/admin/pending", get(handle_admin_pending))
        .route(
            "/api/admin/pending/{item_type}/{filename}",
            get(handle_admin_pending_item),
        )
        .route("/api/admin/approve", post(handle_admin_approve))
        .route("/api/admin/reject", post(handle_admin_reject))
        .route("/api/admin/edit", post(handle_admin_edit))
        .route("/api/admin/approve-all", post(handle_admin_approve_all))
        .route("/api/admin/stats", get(handle_admin_stats))
        .route("/api/admin/push-to-hf", post(handle_admin_push))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Start the curation server on the configured bind address. Runs until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(config.storage.data_dir.clone());
    store.ensure_dirs()?;

    let bind_addr = config.server.bind.clone();
    let state = AppState::new(Arc::new(config.clone()), Arc::new(store));
    let app = router(state);

    println!("Curation server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error body. Every failure carries `success: false` plus a
/// human-readable message.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Remote(_) => StatusCode::BAD_GATEWAY,
            Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn parse_stage(item_type: &str) -> Result<Stage, ApiError> {
    Stage::from_request_type(item_type)
        .ok_or_else(|| bad_request(format!("Unknown item type: {item_type}")))
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

// ============ Raw stage ============

#[derive(Deserialize)]
struct RawSubmitRequest {
    filename: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    source: Option<String>,
    content: String,
}

#[derive(Serialize)]
struct SubmitResponse {
    success: bool,
    filename: String,
}

async fn handle_raw_submit(
    State(state): State<AppState>,
    Json(req): Json<RawSubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let submission = RawSubmission {
        filename: req.filename,
        language: req
            .language
            .unwrap_or_else(|| state.config.content.default_language.clone()),
        source: req.source.unwrap_or_else(|| "unknown".to_string()),
        content: req.content,
    };
    let meta = raw::submit(&state.store, &submission)?;
    Ok(Json(SubmitResponse {
        success: true,
        filename: meta.filename,
    }))
}

#[derive(Serialize)]
struct ItemListResponse {
    success: bool,
    files: Vec<ItemMeta>,
    count: usize,
}

fn list_response(store: &Store, stage: Stage, status: ItemStatus) -> Result<ItemListResponse, ApiError> {
    let files = store.list_items(stage, status)?;
    Ok(ItemListResponse {
        success: true,
        count: files.len(),
        files,
    })
}

async fn handle_raw_pending(
    State(state): State<AppState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    Ok(Json(list_response(&state.store, Stage::Raw, ItemStatus::Pending)?))
}

async fn handle_raw_approved(
    State(state): State<AppState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    Ok(Json(list_response(&state.store, Stage::Raw, ItemStatus::Approved)?))
}

#[derive(Serialize)]
struct ItemResponse {
    success: bool,
    item: ItemView,
    /// Which queue the document was found in.
    location: ItemStatus,
}

#[derive(Serialize)]
struct ItemView {
    filename: String,
    content: String,
    meta: ItemMeta,
}

fn get_item_response(
    store: &Store,
    stage: Stage,
    filename: &str,
) -> Result<ItemResponse, ApiError> {
    // Pending first, then approved
    for status in [ItemStatus::Pending, ItemStatus::Approved] {
        if let Some(item) = store.get_item(stage, status, filename)? {
            return Ok(ItemResponse {
                success: true,
                item: ItemView {
                    filename: item.filename,
                    content: item.content,
                    meta: item.meta,
                },
                location: status,
            });
        }
    }
    Err(Error::not_found(format!("No {stage} item named \"{filename}\"")).into())
}

async fn handle_raw_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    Ok(Json(get_item_response(&state.store, Stage::Raw, &filename)?))
}

// ============ Cleaning stage ============

#[derive(Serialize)]
struct RawFilesResponse {
    success: bool,
    files: Vec<cleaning::RawFileView>,
}

async fn handle_cleaning_raw_files(
    State(state): State<AppState>,
) -> Result<Json<RawFilesResponse>, ApiError> {
    let files = cleaning::list_raw_files(&state.store)?;
    Ok(Json(RawFilesResponse {
        success: true,
        files,
    }))
}

#[derive(Deserialize)]
struct CleaningSubmitRequest {
    filename: String,
    content: String,
}

async fn handle_cleaning_submit(
    State(state): State<AppState>,
    Json(req): Json<CleaningSubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let meta = cleaning::submit(&state.store, &req.filename, &req.content)?;
    Ok(Json(SubmitResponse {
        success: true,
        filename: meta.filename,
    }))
}

async fn handle_cleaning_pending(
    State(state): State<AppState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    Ok(Json(list_response(&state.store, Stage::Cleaned, ItemStatus::Pending)?))
}

async fn handle_cleaning_approved(
    State(state): State<AppState>,
) -> Result<Json<ItemListResponse>, ApiError> {
    Ok(Json(list_response(&state.store, Stage::Cleaned, ItemStatus::Approved)?))
}

async fn handle_cleaning_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    Ok(Json(get_item_response(&state.store, Stage::Cleaned, &filename)?))
}

// ============ Chunking stage ============

#[derive(Serialize)]
struct CleanedFilesResponse {
    success: bool,
    files: Vec<chunking::CleanedFileView>,
}

async fn handle_chunking_cleaned_files(
    State(state): State<AppState>,
) -> Result<Json<CleanedFilesResponse>, ApiError> {
    let files = chunking::list_cleaned_files(&state.store)?;
    Ok(Json(CleanedFilesResponse {
        success: true,
        files,
    }))
}

#[derive(Deserialize)]
struct ChunkSubmitRequest {
    filename: String,
    text: String,
    category: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    overlap_reference: Option<String>,
}

#[derive(Serialize)]
struct ChunkSubmitResponse {
    success: bool,
    chunk_index: u32,
    chunk_id: String,
}

async fn handle_chunking_submit(
    State(state): State<AppState>,
    Json(req): Json<ChunkSubmitRequest>,
) -> Result<Json<ChunkSubmitResponse>, ApiError> {
    let chunk = chunking::submit(
        &state.store,
        &ChunkSubmission {
            filename: req.filename,
            text: req.text,
            category: req.category,
            source: req.source,
            overlap_reference: req.overlap_reference,
        },
    )?;
    Ok(Json(ChunkSubmitResponse {
        success: true,
        chunk_index: chunk.chunk_index,
        chunk_id: chunk.chunk_id,
    }))
}

#[derive(Deserialize)]
struct BatchChunkRequest {
    filename: String,
    chunks: Vec<BatchChunkRequestEntry>,
}

#[derive(Deserialize)]
struct BatchChunkRequestEntry {
    #[serde(default)]
    text: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    overlap_reference: Option<String>,
}

#[derive(Serialize)]
struct BatchChunkResponse {
    success: bool,
    created: usize,
    chunk_ids: Vec<String>,
}

async fn handle_chunking_submit_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchChunkRequest>,
) -> Result<Json<BatchChunkResponse>, ApiError> {
    let entries: Vec<BatchChunkEntry> = req
        .chunks
        .into_iter()
        .map(|c| BatchChunkEntry {
            text: c.text,
            category: c.category,
            source: c.source,
            overlap_reference: c.overlap_reference,
        })
        .collect();
    let created = chunking::submit_batch(&state.store, &req.filename, &entries)?;
    Ok(Json(BatchChunkResponse {
        success: true,
        created: created.len(),
        chunk_ids: created.into_iter().map(|c| c.chunk_id).collect(),
    }))
}

#[derive(Serialize)]
struct ChunkListResponse {
    success: bool,
    chunks: Vec<ChunkRecord>,
    count: usize,
}

async fn handle_chunking_chunks(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<ChunkListResponse>, ApiError> {
    let chunks = chunking::list_chunks(&state.store, &filename)?;
    Ok(Json(ChunkListResponse {
        success: true,
        count: chunks.len(),
        chunks,
    }))
}

#[derive(Serialize)]
struct PendingChunksResponse {
    success: bool,
    pending: BTreeMap<String, Vec<ChunkRecord>>,
    count: usize,
}

async fn handle_chunking_pending(
    State(state): State<AppState>,
) -> Result<Json<PendingChunksResponse>, ApiError> {
    let pending = state.store.list_chunk_sets(ItemStatus::Pending)?;
    let count = pending.values().map(|c| c.len()).sum();
    Ok(Json(PendingChunksResponse {
        success: true,
        pending,
        count,
    }))
}

#[derive(Serialize)]
struct OkResponse {
    success: bool,
}

async fn handle_chunking_delete(
    State(state): State<AppState>,
    Path((filename, index)): Path<(String, u32)>,
) -> Result<Json<OkResponse>, ApiError> {
    state.store.delete_chunk(&filename, index)?;
    Ok(Json(OkResponse { success: true }))
}

// ============ Admin review queue ============

#[derive(Serialize)]
struct AdminPendingResponse {
    success: bool,
    pending: PendingQueues,
    totals: StageTotals,
}

/// The three review queues, keyed the way the admin frontend renders them.
#[derive(Serialize)]
struct PendingQueues {
    raw: Vec<ItemMeta>,
    cleaned: Vec<ItemMeta>,
    chunked: BTreeMap<String, Vec<ChunkRecord>>,
}

async fn handle_admin_pending(
    State(state): State<AppState>,
) -> Result<Json<AdminPendingResponse>, ApiError> {
    let overview = approval::pending_overview(&state.store)?;
    Ok(Json(AdminPendingResponse {
        success: true,
        pending: PendingQueues {
            raw: overview.raw,
            cleaned: overview.cleaned,
            chunked: overview.chunked,
        },
        totals: overview.totals,
    }))
}

#[derive(Deserialize)]
struct PendingItemQuery {
    #[serde(default)]
    chunk_index: Option<u32>,
}

#[derive(Serialize)]
struct PendingChunkResponse {
    success: bool,
    chunk: ChunkRecord,
}

async fn handle_admin_pending_item(
    State(state): State<AppState>,
    Path((item_type, filename)): Path<(String, String)>,
    Query(query): Query<PendingItemQuery>,
) -> Result<Response, ApiError> {
    let stage = parse_stage(&item_type)?;
    if stage == Stage::Chunked {
        let index = query
            .chunk_index
            .ok_or_else(|| bad_request("chunk_index is required for pending chunk lookups"))?;
        let chunk = state
            .store
            .get_chunk(ItemStatus::Pending, &filename, index)?
            .ok_or_else(|| {
                Error::not_found(format!("No pending chunk {index} for \"{filename}\""))
            })?;
        return Ok(Json(PendingChunkResponse {
            success: true,
            chunk,
        })
        .into_response());
    }
    let item = approval::get_pending_item(&state.store, stage, &filename)?;
    Ok(Json(ItemResponse {
        success: true,
        item: ItemView {
            filename: item.filename,
            content: item.content,
            meta: item.meta,
        },
        location: ItemStatus::Pending,
    })
    .into_response())
}

/// Review action shared by approve, reject, and edit. Chunk actions carry
/// `chunk_index`; item actions do not.
#[derive(Deserialize)]
struct ReviewRequest {
    #[serde(rename = "type")]
    item_type: String,
    filename: String,
    #[serde(default)]
    chunk_index: Option<u32>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

fn require_chunk_index(req: &ReviewRequest) -> Result<u32, ApiError> {
    req.chunk_index
        .ok_or_else(|| bad_request("chunk_index is required for chunk actions"))
}

async fn handle_admin_approve(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    match parse_stage(&req.item_type)? {
        Stage::Chunked => {
            approval::approve_chunk(&state.store, &req.filename, require_chunk_index(&req)?)?;
        }
        stage => {
            approval::approve_item(&state.store, stage, &req.filename)?;
        }
    }
    Ok(Json(OkResponse { success: true }))
}

async fn handle_admin_reject(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    match parse_stage(&req.item_type)? {
        Stage::Chunked => {
            approval::reject_chunk(
                &state.store,
                &req.filename,
                require_chunk_index(&req)?,
                req.reason.as_deref(),
            )?;
        }
        stage => {
            approval::reject_item(&state.store, stage, &req.filename, req.reason.as_deref())?;
        }
    }
    Ok(Json(OkResponse { success: true }))
}

async fn handle_admin_edit(
    State(state): State<AppState>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let content = req
        .content
        .as_deref()
        .ok_or_else(|| bad_request("content is required for edits"))?;
    match parse_stage(&req.item_type)? {
        Stage::Chunked => {
            approval::edit_chunk(&state.store, &req.filename, require_chunk_index(&req)?, content)?;
        }
        stage => {
            approval::edit_item(&state.store, stage, &req.filename, content)?;
        }
    }
    Ok(Json(OkResponse { success: true }))
}

#[derive(Deserialize)]
struct ApproveAllRequest {
    #[serde(rename = "type")]
    item_type: String,
    /// Required for chunk bulk approval; names the source file.
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Serialize)]
struct ApproveAllResponse {
    success: bool,
    approved_count: usize,
}

async fn handle_admin_approve_all(
    State(state): State<AppState>,
    Json(req): Json<ApproveAllRequest>,
) -> Result<Json<ApproveAllResponse>, ApiError> {
    let approved_count = match parse_stage(&req.item_type)? {
        Stage::Chunked => {
            let filename = req
                .filename
                .as_deref()
                .ok_or_else(|| bad_request("filename is required for chunk bulk approval"))?;
            approval::approve_all_chunks(&state.store, filename)?
        }
        stage => approval::approve_all_items(&state.store, stage)?,
    };
    Ok(Json(ApproveAllResponse {
        success: true,
        approved_count,
    }))
}

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    stats: approval::CurationStats,
}

async fn handle_admin_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApiError> {
    Ok(Json(StatsResponse {
        success: true,
        stats: approval::stats(&state.store)?,
    }))
}

// ============ Hub export ============

#[derive(Deserialize)]
struct PushRequest {
    /// `raw`, `cleaned`, `chunked`, or `all`.
    #[serde(rename = "type")]
    push_type: String,
    #[serde(default)]
    hf_token: Option<String>,
    /// Optional single repository overriding the per-stage targets.
    #[serde(default)]
    repo: Option<String>,
}

#[derive(Serialize)]
struct PushResponse {
    success: bool,
    results: PushResults,
    totals: export::PushOutcome,
}

/// Per-stage upload outcomes; combined totals sit alongside.
#[derive(Serialize)]
struct PushResults {
    raw: export::PushOutcome,
    cleaned: export::PushOutcome,
    chunked: export::PushOutcome,
}

async fn handle_admin_push(
    State(state): State<AppState>,
    Json(req): Json<PushRequest>,
) -> Result<Json<PushResponse>, ApiError> {
    let scope = PushScope::from_request_type(&req.push_type)
        .ok_or_else(|| bad_request(format!("Unknown push type: {}", req.push_type)))?;
    let token = hub::resolve_token(req.hf_token.as_deref())?;
    let client = HfHubClient::new(&state.config.hub.endpoint, &token);

    let results = export::push_all(
        &state.store,
        &client,
        &state.config.hub,
        scope,
        req.repo.as_deref(),
    )
    .await?;
    Ok(Json(PushResponse {
        success: true,
        results: PushResults {
            raw: results.raw,
            cleaned: results.cleaned,
            chunked: results.chunked,
        },
        totals: results.totals,
    }))
}
