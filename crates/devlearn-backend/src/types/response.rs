//! HTTP response bodies

use serde::{Deserialize, Serialize};

use super::document::{Document, FileType};

/// Characters of extracted text echoed back on upload
pub const TEXT_PREVIEW_CHARS: usize = 200;

/// Body returned by a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub document_id: i64,
    pub filename: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub text_preview: String,
}

impl From<&Document> for UploadResponse {
    fn from(doc: &Document) -> Self {
        Self {
            success: true,
            message: "File uploaded successfully".to_string(),
            document_id: doc.id,
            filename: doc.original_filename.clone(),
            file_type: doc.file_type,
            file_size: doc.file_size,
            text_preview: doc.text_preview(TEXT_PREVIEW_CHARS),
        }
    }
}

/// Body of a status update request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// Query parameters accepted by the document listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFilter {
    pub status: Option<String>,
    pub file_type: Option<String>,
}
