//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Upload routes for avatars, covers and chapter pages
//! - Delete and info routes addressing files by URL
//! - Static serving of the local storage root under `/files/`

pub mod error;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use inkpress_storage::StorageService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ApiResult, ErrorResponse};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend selected at startup.
    pub storage: StorageService,
}

/// Creates the main application router.
///
/// Request bodies are capped at `max_body_bytes`. When the local backend is
/// active its root is served under `/files/`.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    let mut router = Router::new().nest("/api/v1", routes::api_routes());

    if let Some(root) = state.storage.local_root() {
        info!(root = %root.display(), "Serving local uploads under /files");
        router = router.nest_service("/files", ServeDir::new(root));
    }

    router
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
