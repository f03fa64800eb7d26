//! Batched JSON file dumps
//!
//! Records are buffered and written out, one file per record, once the
//! buffer reaches its threshold.

use crate::record::DocumentRecord;
use crate::storage::traits::{RecordSink, Settlement, StorageError, StorageResult};
use crate::url::{disambiguated_record_filename, record_filename};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Buffers records and dumps them as `<sanitized-link>html.json` files
pub struct FileBatchSink {
    dir: PathBuf,
    threshold: usize,
    buffer: Vec<(u64, DocumentRecord)>,

    /// Filename -> link of the record that owns it
    claimed: HashMap<String, String>,
}

impl FileBatchSink {
    /// Creates a sink writing into `dir`
    ///
    /// A threshold of 0 is treated as 1.
    pub fn new(dir: impl Into<PathBuf>, threshold: usize) -> Self {
        Self {
            dir: dir.into(),
            threshold: threshold.max(1),
            buffer: Vec::new(),
            claimed: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Writes out every buffered record, most recent first
    ///
    /// Each write is independent; a failed write is logged and reported in
    /// the settlement while the rest continue. The buffer is empty afterwards.
    pub fn drain(&mut self) -> Settlement {
        let mut settlement = Settlement::default();

        while let Some((tag, record)) = self.buffer.pop() {
            match self.write_record(&record) {
                Ok(path) => {
                    tracing::info!("Stored file {}", path.display());
                    settlement.persisted.push(tag);
                    settlement.files_written += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to store record {}: {}", record.link, e);
                    settlement.failed.push(tag);
                }
            }
        }

        settlement
    }

    fn write_record(&mut self, record: &DocumentRecord) -> StorageResult<PathBuf> {
        let name = self.target_filename(&record.link);
        let path = self.dir.join(name);
        let body = record.to_json()?;
        std::fs::write(&path, body).map_err(|source| StorageError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }

    /// Picks the filename for `link`, avoiding names owned by other links
    fn target_filename(&mut self, link: &str) -> String {
        let plain = record_filename(link);

        let taken = match self.claimed.get(&plain) {
            Some(owner) => owner != link,
            None => {
                let existing = self.dir.join(&plain);
                existing.exists() && stored_link(&existing).as_deref() != Some(link)
            }
        };

        let name = if taken {
            let alternative = disambiguated_record_filename(link);
            tracing::debug!(
                "Filename {} belongs to another link, using {}",
                plain,
                alternative
            );
            alternative
        } else {
            plain
        };

        self.claimed.insert(name.clone(), link.to_string());
        name
    }
}

/// The `link` of the record stored at `path`, if it parses
fn stored_link(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    DocumentRecord::from_json(&bytes).ok().map(|record| record.link)
}

impl RecordSink for FileBatchSink {
    fn accept(&mut self, tag: u64, record: DocumentRecord) -> Settlement {
        self.buffer.push((tag, record));
        if self.buffer.len() >= self.threshold {
            self.drain()
        } else {
            Settlement::default()
        }
    }

    fn flush(&mut self) -> Settlement {
        self.drain()
    }

    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
