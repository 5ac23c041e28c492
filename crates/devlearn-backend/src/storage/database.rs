//! SQLite-backed document store
//!
//! Holds the `documents` table: one row per successfully ingested upload.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Document, FileType, NewDocument, ProcessingStatus};

/// Persistent table of document metadata
///
/// Implementations must assign ids at insert time and never reuse them.
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document and return it with its assigned id
    fn save(&self, document: NewDocument) -> Result<Document>;

    /// Look up a document by id
    fn find_by_id(&self, id: i64) -> Result<Option<Document>>;

    /// All documents in ascending id order
    fn find_all(&self) -> Result<Vec<Document>>;

    /// Documents with the given processing status
    fn find_by_status(&self, status: ProcessingStatus) -> Result<Vec<Document>>;

    /// Documents of the given file type
    fn find_by_file_type(&self, file_type: FileType) -> Result<Vec<Document>>;

    /// Re-persist an existing document. Returns `NotFound` if the row is gone.
    fn update(&self, document: &Document) -> Result<()>;
}

/// SQLite implementation of [`DocumentRepository`]
pub struct SqliteDocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentRepository {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::database(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate(true)?;
        Ok(db)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate(false)?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self, on_disk: bool) -> Result<()> {
        let conn = self.conn.lock();

        if on_disk {
            conn.execute_batch(
                r#"
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
            "#,
            )
            .map_err(|e| Error::database(format!("Failed to set pragmas: {}", e)))?;
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_filename TEXT NOT NULL,
                stored_filename TEXT NOT NULL UNIQUE,
                file_type TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                extracted_text TEXT NOT NULL,
                processing_status TEXT NOT NULL,
                upload_timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_documents_processing_status ON documents(processing_status);
            CREATE INDEX IF NOT EXISTS idx_documents_file_type ON documents(file_type);
        "#,
        )
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

        tracing::debug!("Database migrations complete");
        Ok(())
    }

    fn query_documents(&self, sql: &str, param: Option<&str>) -> Result<Vec<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let rows = match param {
            Some(value) => stmt.query_map(params![value], row_to_document),
            None => stmt.query_map([], row_to_document),
        }
        .map_err(|e| Error::database(format!("Failed to list documents: {}", e)))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::database(format!("Failed to read document row: {}", e)))
    }
}

const SELECT_COLUMNS: &str = "SELECT id, original_filename, stored_filename, file_type, file_size, \
     extracted_text, processing_status, upload_timestamp FROM documents";

impl DocumentRepository for SqliteDocumentRepository {
    fn save(&self, document: NewDocument) -> Result<Document> {
        let conn = self.conn.lock();

        conn.execute(
            r#"
            INSERT INTO documents (
                original_filename, stored_filename, file_type, file_size,
                extracted_text, processing_status, upload_timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                document.original_filename,
                document.stored_filename,
                document.file_type.as_str(),
                document.file_size as i64,
                document.extracted_text,
                document.processing_status.as_str(),
                document.upload_timestamp.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::database(format!("Failed to insert document: {}", e)))?;

        let id = conn.last_insert_rowid();
        Ok(document.with_id(id))
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Document>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        stmt.query_row(params![id], row_to_document)
            .optional()
            .map_err(|e| Error::database(format!("Failed to get document: {}", e)))
    }

    fn find_all(&self) -> Result<Vec<Document>> {
        self.query_documents(&format!("{} ORDER BY id ASC", SELECT_COLUMNS), None)
    }

    fn find_by_status(&self, status: ProcessingStatus) -> Result<Vec<Document>> {
        self.query_documents(
            &format!("{} WHERE processing_status = ?1 ORDER BY id ASC", SELECT_COLUMNS),
            Some(status.as_str()),
        )
    }

    fn find_by_file_type(&self, file_type: FileType) -> Result<Vec<Document>> {
        self.query_documents(
            &format!("{} WHERE file_type = ?1 ORDER BY id ASC", SELECT_COLUMNS),
            Some(file_type.as_str()),
        )
    }

    fn update(&self, document: &Document) -> Result<()> {
        let conn = self.conn.lock();

        // upload_timestamp and stored_filename are write-once
        let count = conn
            .execute(
                r#"
                UPDATE documents SET
                    original_filename = ?2,
                    file_type = ?3,
                    file_size = ?4,
                    extracted_text = ?5,
                    processing_status = ?6
                WHERE id = ?1
                "#,
                params![
                    document.id,
                    document.original_filename,
                    document.file_type.as_str(),
                    document.file_size as i64,
                    document.extracted_text,
                    document.processing_status.as_str(),
                ],
            )
            .map_err(|e| Error::database(format!("Failed to update document: {}", e)))?;

        if count == 0 {
            return Err(Error::NotFound(document.id));
        }
        Ok(())
    }
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let file_type_str: String = row.get(3)?;
    let file_size: i64 = row.get(4)?;
    let status_str: String = row.get(6)?;
    let timestamp_str: String = row.get(7)?;

    let file_type = file_type_str
        .parse::<FileType>()
        .map_err(|e| conversion_error(3, e))?;
    let processing_status = status_str
        .parse::<ProcessingStatus>()
        .map_err(|e| conversion_error(6, e))?;
    let upload_timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| conversion_error(7, e))?;

    Ok(Document {
        id: row.get(0)?,
        original_filename: row.get(1)?,
        stored_filename: row.get(2)?,
        file_type,
        file_size: file_size as u64,
        extracted_text: row.get(5)?,
        processing_status,
        upload_timestamp,
    })
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(name: &str, stored: &str, file_type: FileType) -> NewDocument {
        NewDocument::new(
            name.to_string(),
            stored.to_string(),
            file_type,
            100,
            format!("text of {}", name),
        )
    }

    #[test]
    fn test_save_and_find_by_id() {
        let db = SqliteDocumentRepository::in_memory().unwrap();

        let saved = db.save(new_doc("notes.pdf", "a.pdf", FileType::Pdf)).unwrap();
        assert!(saved.id > 0);
        assert_eq!(saved.processing_status, ProcessingStatus::Pending);

        let fetched = db.find_by_id(saved.id).unwrap().unwrap();
        assert_eq!(fetched.original_filename, "notes.pdf");
        assert_eq!(fetched.extracted_text, "text of notes.pdf");
        assert_eq!(fetched.file_type, FileType::Pdf);
        assert_eq!(fetched.upload_timestamp, saved.upload_timestamp);
    }

    #[test]
    fn test_find_by_id_miss() {
        let db = SqliteDocumentRepository::in_memory().unwrap();
        assert!(db.find_by_id(99).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_distinct_and_ordered() {
        let db = SqliteDocumentRepository::in_memory().unwrap();

        let first = db.save(new_doc("same.pdf", "1.pdf", FileType::Pdf)).unwrap();
        let second = db.save(new_doc("same.pdf", "2.pdf", FileType::Pdf)).unwrap();
        assert_ne!(first.id, second.id);

        let all = db.find_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
        assert_eq!(all[1].id, second.id);
    }

    #[test]
    fn test_stored_filename_is_unique() {
        let db = SqliteDocumentRepository::in_memory().unwrap();
        db.save(new_doc("a.pdf", "dup.pdf", FileType::Pdf)).unwrap();
        let err = db.save(new_doc("b.pdf", "dup.pdf", FileType::Pdf)).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn test_filters() {
        let db = SqliteDocumentRepository::in_memory().unwrap();

        db.save(new_doc("a.pdf", "a.pdf", FileType::Pdf)).unwrap();
        let deck = db.save(new_doc("b.pptx", "b.pptx", FileType::Pptx)).unwrap();

        let mut done = deck.clone();
        done.processing_status = ProcessingStatus::Completed;
        db.update(&done).unwrap();

        let pptx = db.find_by_file_type(FileType::Pptx).unwrap();
        assert_eq!(pptx.len(), 1);
        assert_eq!(pptx[0].id, deck.id);

        assert_eq!(db.find_by_status(ProcessingStatus::Pending).unwrap().len(), 1);
        let completed = db.find_by_status(ProcessingStatus::Completed).unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].original_filename, "b.pptx");
    }

    #[test]
    fn test_update_missing_row() {
        let db = SqliteDocumentRepository::in_memory().unwrap();
        let ghost = new_doc("ghost.pdf", "ghost.pdf", FileType::Pdf).with_id(5);
        assert!(matches!(db.update(&ghost), Err(Error::NotFound(5))));
    }

    #[test]
    fn test_on_disk_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("documents.db");

        let id = {
            let db = SqliteDocumentRepository::new(&path).unwrap();
            db.save(new_doc("keep.pdf", "keep.pdf", FileType::Pdf)).unwrap().id
        };

        let reopened = SqliteDocumentRepository::new(&path).unwrap();
        let doc = reopened.find_by_id(id).unwrap().unwrap();
        assert_eq!(doc.original_filename, "keep.pdf");
    }
}
