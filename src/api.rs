// HTTP API - Upload two exports, browse the result
// Routes are mounted under /api by bin/server.rs

use crate::db::FollowStore;
use crate::error::AnalysisError;
use crate::model::{filter_users, FollowData, ListKind, User};
use crate::session::FollowSession;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::error;

/// Shared application state
pub struct AppState<S: FollowStore> {
    session: Arc<Mutex<FollowSession<S>>>,
}

impl<S: FollowStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        AppState {
            session: Arc::clone(&self.session),
        }
    }
}

impl<S: FollowStore> AppState<S> {
    pub fn new(session: FollowSession<S>) -> Self {
        AppState {
            session: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FollowSession<S>>, Response> {
        self.session.lock().map_err(|_| {
            error!("session lock poisoned");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "storageError", "session unavailable")
        })
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

#[derive(Serialize)]
struct ApiError {
    code: String,
    message: String,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

fn failure(status: StatusCode, code: &str, message: &str) -> Response {
    let body: ApiResponse<()> = ApiResponse {
        success: false,
        data: None,
        error: Some(ApiError {
            code: code.to_string(),
            message: message.to_string(),
        }),
    };
    (status, Json(body)).into_response()
}

fn analysis_failure(err: &AnalysisError) -> Response {
    let status = match err {
        AnalysisError::MissingInput | AnalysisError::UnparseableContent { .. } => {
            StatusCode::BAD_REQUEST
        }
        AnalysisError::InvalidFormat => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::RemoteFetchFailed(_) => StatusCode::BAD_GATEWAY,
        AnalysisError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    failure(status, err.code(), &err.to_string())
}

/// Raw contents of the two export files
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub followers: Option<String>,
    pub following: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Serialize)]
struct ListResponse {
    list: ListKind,
    total: usize,
    users: Vec<User>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/analyze - Analyze two uploaded exports
async fn analyze<S: FollowStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<AnalyzeRequest>,
) -> Response {
    let mut session = match state.lock() {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match session.process_files(req.followers.as_deref(), req.following.as_deref()) {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data.clone()))).into_response(),
        Err(e) => {
            error!(code = e.code(), "analysis failed: {}", e);
            analysis_failure(&e)
        }
    }
}

/// GET /api/data - Current analysis
async fn get_data<S: FollowStore>(State(state): State<AppState<S>>) -> Response {
    let session = match state.lock() {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match session.data() {
        Some(data) => Json(ApiResponse::<FollowData>::ok(data.clone())).into_response(),
        None => failure(StatusCode::NOT_FOUND, "emptyList", "no analysis loaded"),
    }
}

/// GET /api/data/:list?q= - One list, optionally searched
async fn get_list<S: FollowStore>(
    State(state): State<AppState<S>>,
    Path(list): Path<String>,
    Query(params): Query<SearchParams>,
) -> Response {
    let kind = match ListKind::parse(&list) {
        Some(kind) => kind,
        None => {
            return failure(
                StatusCode::NOT_FOUND,
                "unknownList",
                &format!("unknown list '{}'", list),
            )
        }
    };

    let session = match state.lock() {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let Some(data) = session.data() else {
        return failure(StatusCode::NOT_FOUND, "emptyList", "no analysis loaded");
    };

    let all = data.list(kind);
    let users: Vec<User> = filter_users(all, params.q.as_deref().unwrap_or(""))
        .into_iter()
        .cloned()
        .collect();

    Json(ApiResponse::ok(ListResponse {
        list: kind,
        total: all.len(),
        users,
    }))
    .into_response()
}

/// DELETE /api/data - Reset
async fn reset<S: FollowStore>(State(state): State<AppState<S>>) -> Response {
    let mut session = match state.lock() {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    match session.reset() {
        Ok(()) => Json(ApiResponse::ok("reset")).into_response(),
        Err(e) => analysis_failure(&e),
    }
}

/// API routes, ready to be nested under /api
pub fn router<S>(state: AppState<S>) -> Router
where
    S: FollowStore + Send + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(analyze::<S>))
        .route("/data", get(get_data::<S>).delete(reset::<S>))
        .route("/data/:list", get(get_list::<S>))
        .with_state(state)
}

// ============================================================================
// TESTS
// ============================================================================
