//! Application state for the document server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::service::DocumentService;
use crate::storage::{SqliteDocumentRepository, UploadStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AppConfig,
    /// Upload pipeline and document queries
    documents: DocumentService,
}

impl AppState {
    /// Open the database and upload directory named in `config`
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!("Initializing document service state...");

        let repository = Arc::new(SqliteDocumentRepository::new(&config.database.path)?);
        tracing::info!("Document store opened at {}", config.database.path.display());

        let uploads = UploadStore::new(config.storage.upload_dir.clone());
        tracing::info!("Uploads will be written to {}", uploads.upload_dir().display());

        Ok(Self::from_parts(config, DocumentService::new(uploads, repository)))
    }

    /// Assemble state from an existing service
    pub fn from_parts(config: AppConfig, documents: DocumentService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, documents }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the document service
    pub fn documents(&self) -> &DocumentService {
        &self.inner.documents
    }
}
