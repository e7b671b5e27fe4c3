//! Image upload routes, one per asset role.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::post,
};
use inkpress_shared::AppError;
use inkpress_storage::{AssetRole, FileStore, FileUpload};
use serde::Serialize;
use tracing::info;

use crate::AppState;
use crate::error::ApiResult;

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{user_id}/avatar", post(upload_avatar))
        .route("/webtoons/{webtoon_id}/cover", post(upload_cover))
        .route(
            "/webtoons/{webtoon_id}/chapters/{chapter_id}/pages",
            post(upload_page),
        )
}

/// Response for a stored image.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public URL of the stored image.
    pub url: String,
}

/// Pull the `file` field out of a multipart body. Other fields are ignored.
async fn read_file_field(mut multipart: Multipart) -> ApiResult<FileUpload> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;
        return Ok(FileUpload::new(bytes, content_type, filename));
    }

    Err(AppError::Validation(format!("multipart field `{FILE_FIELD}` is required")).into())
}

async fn store(
    state: &AppState,
    multipart: Multipart,
    role: AssetRole,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let upload = read_file_field(multipart).await?;
    let url = state.storage.store_for_role(&upload, &role).await?;
    info!(url = %url, subdirectory = %role.subdirectory(), "Image stored");
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

/// POST `/users/{user_id}/avatar`
async fn upload_avatar(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    store(&state, multipart, AssetRole::Avatar { user_id }).await
}

/// POST `/webtoons/{webtoon_id}/cover`
async fn upload_cover(
    State(state): State<AppState>,
    Path(webtoon_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    store(&state, multipart, AssetRole::Cover { webtoon_id }).await
}

/// POST `/webtoons/{webtoon_id}/chapters/{chapter_id}/pages`
async fn upload_page(
    State(state): State<AppState>,
    Path((webtoon_id, chapter_id)): Path<(String, String)>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    store(
        &state,
        multipart,
        AssetRole::Page {
            webtoon_id,
            chapter_id,
        },
    )
    .await
}
