//! devlearn-backend: document upload service for the DevLearn learning platform
//!
//! Accepts PDF and PowerPoint (.pptx) uploads over HTTP, stores them on disk,
//! extracts their plain text and keeps the document metadata in SQLite.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod server;
pub mod service;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use ingestion::{ExtractorRegistry, IngestPipeline, TextExtractor};
pub use server::DocServer;
pub use service::DocumentService;
pub use storage::{DocumentRepository, SqliteDocumentRepository, UploadStore};
pub use types::{
    document::{Document, FileType, NewDocument, ProcessingStatus},
    response::UploadResponse,
};
