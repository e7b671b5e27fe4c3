//! Routes addressing stored files by their public URL.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use inkpress_shared::AppError;
use inkpress_storage::FileStore;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiResult;

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/files", delete(delete_file))
        .route("/files/info", get(file_info))
}

/// Query string naming a stored file.
#[derive(Debug, Deserialize)]
pub struct FileQuery {
    /// Public URL returned when the file was stored.
    pub url: String,
}

/// Existence and size of a stored file.
#[derive(Debug, Serialize)]
pub struct FileInfoResponse {
    /// The URL that was probed.
    pub url: String,
    /// Whether the backend holds the file.
    pub exists: bool,
    /// Size in bytes, 0 when absent.
    pub size: u64,
}

/// DELETE `/files?url=...`
async fn delete_file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<StatusCode> {
    if state.storage.delete(&query.url).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("no stored file at {}", query.url)).into())
    }
}

/// GET `/files/info?url=...`
async fn file_info(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> Json<FileInfoResponse> {
    let exists = state.storage.exists(&query.url).await;
    let size = if exists {
        state.storage.size(&query.url).await
    } else {
        0
    };
    Json(FileInfoResponse {
        url: query.url,
        exists,
        size,
    })
}
