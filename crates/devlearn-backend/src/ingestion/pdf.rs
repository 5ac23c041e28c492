//! PDF text extraction

use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, Result};
use crate::types::FileType;

use super::extractor::TextExtractor;

const PLACEHOLDER_NAME: &str = "document.pdf";

/// Extracts the text of every page, in page order
///
/// `pdf-extract` does the work; when it rejects or panics on a file the
/// `lopdf` page-by-page extractor is tried before giving up.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_with_pdf_extract(data: &[u8]) -> std::result::Result<Vec<String>, String> {
        match panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(data)
        })) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("pdf-extract panicked while decoding the document".to_string()),
        }
    }

    fn extract_with_lopdf(data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(PLACEHOLDER_NAME, format!("Failed to load PDF: {}", e)))?;

        if doc.is_encrypted() {
            return Err(Error::extraction(PLACEHOLDER_NAME, "PDF is encrypted"));
        }

        let mut pages = Vec::new();
        // get_pages is keyed by 1-based page number, so iteration is page order
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::debug!("No text for page {}: {}", page_number, e);
                    pages.push(String::new());
                }
            }
        }

        Ok(pages)
    }
}

impl TextExtractor for PdfExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn extract_bytes(&self, data: &[u8]) -> Result<String> {
        let pages = match Self::extract_with_pdf_extract(data) {
            Ok(pages) => pages,
            Err(reason) => {
                tracing::warn!("pdf-extract failed: {}, trying lopdf", reason);
                Self::extract_with_lopdf(data)?
            }
        };

        let text: String = pages.concat().replace('\0', "");
        if text.trim().is_empty() {
            tracing::debug!("PDF has no extractable text (image-only or blank pages)");
        }
        Ok(text)
    }
}
