//! Text extraction capability and per-type dispatch

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::FileType;

use super::pdf::PdfExtractor;
use super::pptx::PresentationExtractor;

/// Converts a stored document into plain text
pub trait TextExtractor: Send + Sync {
    /// Format this extractor understands
    fn file_type(&self) -> FileType;

    /// Extract text from in-memory document bytes
    fn extract_bytes(&self, data: &[u8]) -> Result<String>;

    /// Extract text from a file on disk. The file is opened read-only and
    /// closed before parsing starts.
    fn extract(&self, path: &Path) -> Result<String> {
        let data = read_document(path)?;
        self.extract_bytes(&data)
            .map_err(|e| with_filename(e, path))
    }
}

/// Read a whole file through a scoped handle
fn read_document(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| {
        Error::extraction(display_name(path), format!("Cannot open file: {}", e))
    })?;

    let mut data = Vec::new();
    file.read_to_end(&mut data).map_err(|e| {
        Error::extraction(display_name(path), format!("Cannot read file: {}", e))
    })?;

    Ok(data)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Replace the placeholder filename adapters use for in-memory input
fn with_filename(err: Error, path: &Path) -> Error {
    match err {
        Error::Extraction { message, .. } => Error::extraction(display_name(path), message),
        other => other,
    }
}

/// Maps each supported file type to its extractor
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<FileType, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor under the type it reports
    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) -> &mut Self {
        self.extractors.insert(extractor.file_type(), extractor);
        self
    }

    /// Extractor for `file_type`, if one is registered
    pub fn get(&self, file_type: FileType) -> Option<&Arc<dyn TextExtractor>> {
        self.extractors.get(&file_type)
    }

    /// Extract `path` with the extractor registered for `file_type`
    pub fn extract(&self, file_type: FileType, path: &Path) -> Result<String> {
        let extractor = self.get(file_type).ok_or_else(|| {
            Error::validation(format!("No extractor registered for {}", file_type))
        })?;
        extractor.extract(path)
    }
}

impl Default for ExtractorRegistry {
    /// PDF and PPTX extractors
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(PdfExtractor::new()))
            .register(Arc::new(PresentationExtractor::new()));
        registry
    }
}
