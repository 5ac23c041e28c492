//! Document ingestion: format-specific text extraction and the upload pipeline

pub mod extractor;
pub(crate) mod pdf;
mod pipeline;
pub(crate) mod pptx;

pub use extractor::{ExtractorRegistry, TextExtractor};
pub use pdf::PdfExtractor;
pub use pipeline::{file_extension, IngestPipeline};
pub use pptx::PresentationExtractor;
