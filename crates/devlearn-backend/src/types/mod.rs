//! Core types for the document backend

pub mod document;
pub mod response;

pub use document::{Document, FileType, NewDocument, ProcessingStatus};
pub use response::{DocumentFilter, StatusUpdateRequest, UploadResponse, TEXT_PREVIEW_CHARS};
