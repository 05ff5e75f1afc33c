// HTTP facing helpers plus the demo routes that exercise them

pub mod api;
pub mod download;
pub mod health;
pub mod json;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Routes of the demo server. Body limits are enforced by the toolkit
/// itself, so axum's default limit is switched off.
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        .route("/api/upload", post(api::upload))
        .route("/api/download/:file", get(api::download))
        .route("/api/slugify", post(api::slugify))
        .route("/api/random", get(api::random))
        .route("/api/push", post(api::push))
        .layer(DefaultBodyLimit::disable())
        .with_state(app_state)
}
