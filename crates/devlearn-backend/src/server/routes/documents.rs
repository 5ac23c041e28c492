//! Document query and status endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::service::DocumentService;
use crate::types::{Document, DocumentFilter, FileType, ProcessingStatus, StatusUpdateRequest};

/// Run a blocking service call off the async runtime
async fn with_service<T, F>(state: AppState, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&DocumentService) -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(state.documents()))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
}

/// GET /api/documents - List documents, optionally filtered by `status` and `fileType`
pub async fn list_documents(
    State(state): State<AppState>,
    query: std::result::Result<Query<DocumentFilter>, QueryRejection>,
) -> Result<Json<Vec<Document>>> {
    let Query(filter) = query?;
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<ProcessingStatus>)
        .transpose()?;
    let file_type = filter
        .file_type
        .as_deref()
        .map(str::parse::<FileType>)
        .transpose()?;

    let documents = with_service(state, move |s| s.list_filtered(status, file_type)).await?;
    Ok(Json(documents))
}

/// GET /api/documents/:id - Get a specific document
pub async fn get_document(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<Document>> {
    let Path(id) = path?;
    let document = with_service(state, move |s| s.get(id)).await?;
    Ok(Json(document))
}

/// PATCH /api/documents/:id/status - Overwrite the processing status
pub async fn update_status(
    State(state): State<AppState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    body: std::result::Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<Document>> {
    let Path(id) = path?;
    let Json(request) = body?;
    let status: ProcessingStatus = request.status.parse()?;
    let document = with_service(state, move |s| s.set_status(id, status)).await?;
    Ok(Json(document))
}
