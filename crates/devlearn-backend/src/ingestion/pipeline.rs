//! Upload ingestion: validate, store, extract, persist

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::storage::{DocumentRepository, StoredFile, UploadStore};
use crate::types::{Document, FileType, NewDocument};

use super::extractor::ExtractorRegistry;

/// Extension after the last `.`; empty when the name has no dot
pub fn file_extension(filename: &str) -> &str {
    filename.rfind('.').map_or("", |i| &filename[i + 1..])
}

/// Validate → store → extract → persist
///
/// Each step is a hard gate. A failure after the bytes are stored removes
/// the stored file again, so a failed upload leaves neither a row nor a file.
pub struct IngestPipeline {
    uploads: UploadStore,
    extractors: ExtractorRegistry,
    repository: Arc<dyn DocumentRepository>,
}

impl IngestPipeline {
    /// Create a pipeline with the default PDF/PPTX extractors
    pub fn new(uploads: UploadStore, repository: Arc<dyn DocumentRepository>) -> Self {
        Self::with_extractors(uploads, ExtractorRegistry::default(), repository)
    }

    /// Create a pipeline with a custom extractor registry
    pub fn with_extractors(
        uploads: UploadStore,
        extractors: ExtractorRegistry,
        repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            uploads,
            extractors,
            repository,
        }
    }

    /// Upload directory backing this pipeline
    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    /// Validate the upload and resolve its type
    pub fn validate(filename: &str, data: &[u8]) -> Result<FileType> {
        if data.is_empty() {
            return Err(Error::validation("File is empty"));
        }

        FileType::from_extension(file_extension(filename))
            .ok_or_else(|| Error::validation("Only PDF and PPTX files are supported"))
    }

    /// Ingest one upload and return the persisted document
    pub fn ingest(&self, filename: &str, data: &[u8]) -> Result<Document> {
        let file_type = Self::validate(filename, data)?;

        let stored = self.uploads.store(file_type.extension(), data)?;

        match self.extract_and_save(filename, file_type, &stored) {
            Ok(document) => Ok(document),
            Err(e) => {
                self.discard(&stored);
                Err(e)
            }
        }
    }

    fn extract_and_save(
        &self,
        filename: &str,
        file_type: FileType,
        stored: &StoredFile,
    ) -> Result<Document> {
        let extracted_text = self
            .extractors
            .extract(file_type, &stored.path)
            .map_err(|e| match e {
                Error::Extraction { message, .. } => Error::extraction(filename, message),
                other => other,
            })?;
        tracing::info!("Text extracted: {} characters", extracted_text.chars().count());

        let document = NewDocument::new(
            filename.to_string(),
            stored.stored_filename.clone(),
            file_type,
            stored.size,
            extracted_text,
        );

        let saved = self.repository.save(document)?;
        tracing::info!("Document saved to database with ID: {}", saved.id);
        Ok(saved)
    }

    fn discard(&self, stored: &StoredFile) {
        if let Err(e) = self.uploads.remove(&stored.stored_filename) {
            tracing::warn!("Could not remove {} after failed upload: {}", stored.stored_filename, e);
        }
    }
}
