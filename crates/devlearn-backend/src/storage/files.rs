//! On-disk storage for uploaded files
//!
//! Every upload lands in one flat directory under a generated
//! `<uuid>.<ext>` name. The original filename never reaches the filesystem.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A file written to the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated `<uuid>.<ext>` name
    pub stored_filename: String,
    /// Full path inside the upload directory
    pub path: PathBuf,
    /// Bytes written
    pub size: u64,
}

/// Allocates collision-free names in the upload directory and writes bytes to them
#[derive(Debug, Clone)]
pub struct UploadStore {
    upload_dir: PathBuf,
}

impl UploadStore {
    /// Create a store rooted at `upload_dir`. The directory is created lazily.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Directory uploads are written to
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Generate a fresh stored name for the given extension.
    ///
    /// Uniqueness rests on the 122 random bits of a v4 UUID; existing files
    /// are not checked.
    pub fn allocate(&self, extension: &str) -> (String, PathBuf) {
        let stored_filename = format!("{}.{}", Uuid::new_v4(), extension.to_ascii_lowercase());
        let path = self.upload_dir.join(&stored_filename);
        (stored_filename, path)
    }

    /// Write `data` under a newly allocated name.
    ///
    /// The bytes are staged in a temporary file inside the upload directory,
    /// synced, then renamed into place, so a reader never sees a partial file.
    pub fn store(&self, extension: &str, data: &[u8]) -> Result<StoredFile> {
        self.ensure_dir()?;

        let (stored_filename, path) = self.allocate(extension);

        let mut staging = NamedTempFile::new_in(&self.upload_dir).map_err(|e| {
            Error::storage(format!(
                "Failed to create staging file in {}: {}",
                self.upload_dir.display(),
                e
            ))
        })?;

        staging
            .write_all(data)
            .and_then(|_| staging.as_file().sync_all())
            .map_err(|e| Error::storage(format!("Failed to write {}: {}", stored_filename, e)))?;

        // Dropping `staging` on any error above removes the temporary file
        staging
            .persist(&path)
            .map_err(|e| Error::storage(format!("Failed to persist {}: {}", stored_filename, e.error)))?;

        tracing::info!("File saved: {} ({} bytes)", stored_filename, data.len());

        Ok(StoredFile {
            stored_filename,
            path,
            size: data.len() as u64,
        })
    }

    /// Remove a stored file. Missing files are not an error.
    pub fn remove(&self, stored_filename: &str) -> Result<()> {
        match fs::remove_file(self.upload_dir.join(stored_filename)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "Failed to remove {}: {}",
                stored_filename, e
            ))),
        }
    }

    /// Path of a previously stored file
    pub fn path_of(&self, stored_filename: &str) -> PathBuf {
        self.upload_dir.join(stored_filename)
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_dir).map_err(|e| {
            Error::storage(format!(
                "Failed to create upload directory {}: {}",
                self.upload_dir.display(),
                e
            ))
        })
    }
}
