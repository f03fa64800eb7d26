//! Sink selection
//!
//! The ingest worker persists through one of three sinks chosen by
//! `[ingest] sink`: file dumps, the document store, or both.

use crate::config::{Config, SinkKind};
use crate::record::DocumentRecord;
use crate::storage::file_sink::FileBatchSink;
use crate::storage::sqlite::SqliteDocumentStore;
use crate::storage::traits::{DocumentStore, RecordSink, Settlement};
use crate::HarvestError;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Inserts every record into a document store as soon as it arrives
pub struct DocumentStoreSink {
    store: Arc<dyn DocumentStore>,
}

impl DocumentStoreSink {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

impl RecordSink for DocumentStoreSink {
    fn accept(&mut self, tag: u64, record: DocumentRecord) -> Settlement {
        let mut settlement = Settlement::default();
        match self.store.insert_one(&record) {
            Ok(id) => {
                tracing::info!("Stored document {} as id {}", record.link, id);
                settlement.persisted.push(tag);
                settlement.documents_stored += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to store document {}: {}", record.link, e);
                settlement.failed.push(tag);
            }
        }
        settlement
    }

    fn flush(&mut self) -> Settlement {
        Settlement::default()
    }

    fn buffered(&self) -> usize {
        0
    }
}

/// The configured persistence backend(s)
pub enum Sink {
    Files(FileBatchSink),
    Documents(DocumentStoreSink),
    Both {
        files: FileBatchSink,
        documents: DocumentStoreSink,

        /// Buffered deliveries whose document insert already failed
        store_failed: HashSet<u64>,
    },
}

impl Sink {
    /// Builds the sink named by `[ingest] sink`
    ///
    /// Creates the output directory and opens the document store as needed.
    /// Both are fatal on failure.
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let files = || -> Result<FileBatchSink, HarvestError> {
            let dir = Path::new(&config.ingest.output_dir);
            std::fs::create_dir_all(dir).map_err(|source| HarvestError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
            Ok(FileBatchSink::new(dir, config.ingest.threshold))
        };

        let documents = || -> Result<DocumentStoreSink, HarvestError> {
            let store_config = config.document_store.as_ref().ok_or_else(|| {
                crate::ConfigError::Validation(
                    "[document-store] is required for this sink".to_string(),
                )
            })?;
            let store = SqliteDocumentStore::open(
                Path::new(&store_config.database_path),
                &store_config.collection,
            )?;
            tracing::debug!(
                "Opened document store {} (collection '{}')",
                store_config.database_path,
                store_config.collection
            );
            Ok(DocumentStoreSink::new(Arc::new(store)))
        };

        Ok(match config.ingest.sink {
            SinkKind::File => Sink::Files(files()?),
            SinkKind::DocumentStore => Sink::Documents(documents()?),
            SinkKind::Both => Sink::both(files()?, documents()?),
        })
    }

    pub fn both(files: FileBatchSink, documents: DocumentStoreSink) -> Self {
        Sink::Both {
            files,
            documents,
            store_failed: HashSet::new(),
        }
    }

    pub fn kind(&self) -> SinkKind {
        match self {
            Sink::Files(_) => SinkKind::File,
            Sink::Documents(_) => SinkKind::DocumentStore,
            Sink::Both { .. } => SinkKind::Both,
        }
    }
}

/// A delivery in `Both` is persisted only once its file is written and its
/// document insert succeeded.
fn settle_both(mut from_files: Settlement, store_failed: &mut HashSet<u64>) -> Settlement {
    let (failed_in_store, persisted): (Vec<u64>, Vec<u64>) = from_files
        .persisted
        .into_iter()
        .partition(|tag| store_failed.contains(tag));

    for tag in failed_in_store.iter().chain(from_files.failed.iter()) {
        store_failed.remove(tag);
    }

    from_files.persisted = persisted;
    from_files.failed.extend(failed_in_store);
    from_files
}

impl RecordSink for Sink {
    fn accept(&mut self, tag: u64, record: DocumentRecord) -> Settlement {
        match self {
            Sink::Files(files) => files.accept(tag, record),
            Sink::Documents(documents) => documents.accept(tag, record),
            Sink::Both {
                files,
                documents,
                store_failed,
            } => {
                let stored = documents.accept(tag, record.clone());
                if !stored.failed.is_empty() {
                    store_failed.insert(tag);
                }
                let mut settlement = settle_both(files.accept(tag, record), store_failed);
                settlement.documents_stored += stored.documents_stored;
                settlement
            }
        }
    }

    fn flush(&mut self) -> Settlement {
        match self {
            Sink::Files(files) => files.flush(),
            Sink::Documents(documents) => documents.flush(),
            Sink::Both {
                files,
                store_failed,
                ..
            } => settle_both(files.flush(), store_failed),
        }
    }

    fn buffered(&self) -> usize {
        match self {
            Sink::Files(files) => files.buffered(),
            Sink::Documents(documents) => documents.buffered(),
            Sink::Both { files, .. } => files.buffered(),
        }
    }
}
