//! Document upload endpoint

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::UploadResponse;

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// POST /api/documents/upload - Upload a PDF or PPTX file
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file", e))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| {
        Error::validation(format!("Required request part '{}' is not present", FILE_FIELD))
    })?;

    tracing::info!("Received file upload request: {} ({} bytes)", filename, data.len());

    let worker_state = state.clone();
    let worker_filename = filename.clone();
    let result = tokio::task::spawn_blocking(move || {
        worker_state.documents().upload(&worker_filename, &data)
    })
    .await
    .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?;

    match result {
        Ok(document) => Ok(Json(UploadResponse::from(&document))),
        Err(e) => {
            tracing::error!("File upload failed for {}: {}", filename, e);
            Err(e)
        }
    }
}

/// Body-limit overruns become 413; anything else is a malformed request
fn multipart_error(context: &str, err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge(format!("{}: file exceeds the upload size limit", context))
    } else {
        Error::validation(format!("{}: {}", context, err.body_text()))
    }
}
