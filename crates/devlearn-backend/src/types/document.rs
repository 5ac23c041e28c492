//! Document metadata types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Supported upload formats
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// PowerPoint presentation (.pptx)
    Pptx,
}

impl FileType {
    /// All supported types
    pub const ALL: [FileType; 2] = [FileType::Pdf, FileType::Pptx];

    /// Detect file type from an extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    /// Lowercase extension used for stored filenames
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Pptx => "pptx",
        }
    }

    /// Uppercase name persisted in the `file_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Pptx => "PPTX",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
            .ok_or_else(|| Error::validation(format!("Unknown file type: {}", s)))
    }
}

/// Lifecycle tag attached to a document
///
/// Any status may follow any other; transitions are not validated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(Error::validation(format!("Unknown processing status: {}", s))),
        }
    }
}

/// A document that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub original_filename: String,
    pub stored_filename: String,
    pub file_type: FileType,
    pub file_size: u64,
    pub extracted_text: String,
    pub processing_status: ProcessingStatus,
    pub upload_timestamp: DateTime<Utc>,
}

impl NewDocument {
    /// Create a pending document stamped with the current time
    pub fn new(
        original_filename: String,
        stored_filename: String,
        file_type: FileType,
        file_size: u64,
        extracted_text: String,
    ) -> Self {
        Self {
            original_filename,
            stored_filename,
            file_type,
            file_size,
            extracted_text,
            processing_status: ProcessingStatus::Pending,
            upload_timestamp: Utc::now(),
        }
    }

    /// Attach the id assigned by the store
    pub fn with_id(self, id: i64) -> Document {
        Document {
            id,
            original_filename: self.original_filename,
            stored_filename: self.stored_filename,
            file_type: self.file_type,
            file_size: self.file_size,
            extracted_text: self.extracted_text,
            processing_status: self.processing_status,
            upload_timestamp: self.upload_timestamp,
        }
    }
}

/// A persisted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Store-assigned id
    pub id: i64,
    /// Filename as uploaded; never used for storage paths
    pub original_filename: String,
    /// Generated `<uuid>.<ext>` name in the upload directory
    pub stored_filename: String,
    pub file_type: FileType,
    /// Bytes written to storage
    pub file_size: u64,
    pub extracted_text: String,
    pub processing_status: ProcessingStatus,
    pub upload_timestamp: DateTime<Utc>,
}

impl Document {
    /// First `limit` characters of the extracted text
    pub fn text_preview(&self, limit: usize) -> String {
        self.extracted_text.chars().take(limit).collect()
    }
}
