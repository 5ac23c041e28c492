//! Persistence: the document table and the upload directory

mod database;
mod files;

pub use database::{DocumentRepository, SqliteDocumentRepository};
pub use files::{StoredFile, UploadStore};
