//! API routes for the document server

pub mod documents;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/documents", get(documents::list_documents))
        // Upload - with larger body limit for file uploads
        .route(
            "/documents/upload",
            post(upload::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/documents/:id", get(documents::get_document))
        .route("/documents/:id/status", patch(documents::update_status))
}

