//! Document operations exposed to the HTTP layer

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ingestion::IngestPipeline;
use crate::storage::{DocumentRepository, UploadStore};
use crate::types::{Document, FileType, ProcessingStatus};

/// Upload, lookup, listing and status updates
pub struct DocumentService {
    pipeline: IngestPipeline,
    repository: Arc<dyn DocumentRepository>,
}

impl DocumentService {
    /// Create a service writing uploads to `uploads` and metadata to `repository`
    pub fn new(uploads: UploadStore, repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            pipeline: IngestPipeline::new(uploads, Arc::clone(&repository)),
            repository,
        }
    }

    /// Create from an already configured pipeline
    pub fn with_pipeline(pipeline: IngestPipeline, repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            pipeline,
            repository,
        }
    }

    /// Validate, store, extract and persist an upload
    pub fn upload(&self, filename: &str, data: &[u8]) -> Result<Document> {
        self.pipeline.ingest(filename, data)
    }

    /// Fetch one document; a miss is [`Error::NotFound`]
    pub fn get(&self, id: i64) -> Result<Document> {
        self.repository.find_by_id(id)?.ok_or(Error::NotFound(id))
    }

    /// All documents
    pub fn list(&self) -> Result<Vec<Document>> {
        self.repository.find_all()
    }

    /// Documents matching the optional status and type filters
    pub fn list_filtered(
        &self,
        status: Option<ProcessingStatus>,
        file_type: Option<FileType>,
    ) -> Result<Vec<Document>> {
        match (status, file_type) {
            (None, None) => self.repository.find_all(),
            (Some(status), None) => self.repository.find_by_status(status),
            (None, Some(file_type)) => self.repository.find_by_file_type(file_type),
            (Some(status), Some(file_type)) => Ok(self
                .repository
                .find_by_status(status)?
                .into_iter()
                .filter(|d| d.file_type == file_type)
                .collect()),
        }
    }

    /// Overwrite the processing status of a document
    pub fn set_status(&self, id: i64, status: ProcessingStatus) -> Result<Document> {
        let mut document = self.get(id)?;
        let previous = document.processing_status;
        document.processing_status = status;
        self.repository.update(&document)?;

        tracing::info!("Document {} status {} -> {}", id, previous, status);
        Ok(document)
    }
}
