//! Storage traits and error types
//!
//! This module defines the interfaces for record sinks and document store
//! backends, and the outcome type a sink reports back to the ingest worker.

use crate::record::DocumentRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document store backends
///
/// A document store holds whole records in a named collection and hands back
/// a generated id for each insert.
pub trait DocumentStore: Send + Sync {
    /// Inserts one record, returning its generated id
    fn insert_one(&self, record: &DocumentRecord) -> StorageResult<i64>;

    /// Counts stored records
    fn count(&self) -> StorageResult<u64>;

    /// Finds every stored copy of the record with this link, oldest first
    fn find_by_link(&self, link: &str) -> StorageResult<Vec<(i64, DocumentRecord)>>;
}

/// Deliveries whose fate a sink has decided
///
/// Tags in `persisted` may be acknowledged; tags in `failed` were not stored.
/// A delivery the sink is still holding appears in neither list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    pub persisted: Vec<u64>,
    pub failed: Vec<u64>,
    pub files_written: u64,
    pub documents_stored: u64,
}

impl Settlement {
    pub fn is_empty(&self) -> bool {
        self.persisted.is_empty() && self.failed.is_empty()
    }
}

/// Trait for ingest-side persistence
pub trait RecordSink {
    /// Takes ownership of one delivered record
    fn accept(&mut self, tag: u64, record: DocumentRecord) -> Settlement;

    /// Persists everything still held
    fn flush(&mut self) -> Settlement;

    /// Number of records held but not yet persisted
    fn buffered(&self) -> usize;
}
