//! Storage module for persisting ingested records
//!
//! This module handles everything the ingest worker writes, including:
//! - Batched JSON file dumps with collision-safe filenames
//! - The SQLite document store and its collection schema
//! - Sink selection from configuration

mod file_sink;
mod schema;
mod sink;
mod sqlite;
mod traits;

pub use file_sink::FileBatchSink;
pub use schema::is_valid_collection_name;
pub use sink::{DocumentStoreSink, Sink};
pub use sqlite::SqliteDocumentStore;
pub use traits::{DocumentStore, RecordSink, Settlement, StorageError, StorageResult};
