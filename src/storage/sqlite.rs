//! SQLite document store implementation
//!
//! Each collection is a table holding the record as JSON alongside its link
//! for lookup.

use crate::record::DocumentRecord;
use crate::storage::schema::{collection_schema, is_valid_collection_name};
use crate::storage::traits::{DocumentStore, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// SQLite document store backend
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteDocumentStore {
    /// Opens (or creates) a document store and its collection
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `collection` - Collection (table) name; must be a plain identifier
    pub fn open(path: &Path, collection: &str) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Self::init(conn, collection)
    }

    /// Opens an existing store for inspection only
    ///
    /// Nothing is created: a missing file or collection is an error.
    pub fn open_read_only(path: &Path, collection: &str) -> StorageResult<Self> {
        if !is_valid_collection_name(collection) {
            return Err(StorageError::InvalidCollection(collection.to_string()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        })
    }

    /// Creates an in-memory store
    pub fn open_in_memory(collection: &str) -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?, collection)
    }

    fn init(conn: Connection, collection: &str) -> StorageResult<Self> {
        if !is_valid_collection_name(collection) {
            return Err(StorageError::InvalidCollection(collection.to_string()));
        }
        conn.execute_batch(&collection_schema(collection))?;
        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn insert_one(&self, record: &DocumentRecord) -> StorageResult<i64> {
        let document = serde_json::to_string(record)?;
        let conn = self.lock();
        conn.execute(
            &format!(
                r#"INSERT INTO "{}" (link, title, document, inserted_at) VALUES (?1, ?2, ?3, ?4)"#,
                self.collection
            ),
            params![record.link, record.title, document, Utc::now().to_rfc3339()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn count(&self) -> StorageResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row(
            &format!(r#"SELECT COUNT(*) FROM "{}""#, self.collection),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn find_by_link(&self, link: &str) -> StorageResult<Vec<(i64, DocumentRecord)>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            r#"SELECT id, document FROM "{}" WHERE link = ?1 ORDER BY id"#,
            self.collection
        ))?;

        let rows = stmt
            .query_map(params![link], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, document)| -> StorageResult<(i64, DocumentRecord)> {
                Ok((id, serde_json::from_str(&document)?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;

    fn record(link: &str) -> DocumentRecord {
        DocumentRecord {
            link: link.to_string(),
            title: "标题".to_string(),
            metadata: Metadata {
                date: "2021年06月01日".to_string(),
                source: "人民网".to_string(),
            },
            content: "正文".to_string(),
            images: vec!["/NMediaFile/1.jpg".to_string()],
        }
    }

    #[test]
    fn test_insert_returns_distinct_ids() {
        let store = SqliteDocumentStore::open_in_memory("peoplecomcn").unwrap();
        let a = store.insert_one(&record("http://a.com/1")).unwrap();
        let b = store.insert_one(&record("http://a.com/2")).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_find_by_link() {
        let store = SqliteDocumentStore::open_in_memory("peoplecomcn").unwrap();
        let id = store.insert_one(&record("http://a.com/1")).unwrap();
        store.insert_one(&record("http://a.com/2")).unwrap();

        let found = store.find_by_link("http://a.com/1").unwrap();
        assert_eq!(found, vec![(id, record("http://a.com/1"))]);
        assert!(store.find_by_link("http://a.com/3").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_inserts_kept() {
        let store = SqliteDocumentStore::open_in_memory("peoplecomcn").unwrap();
        store.insert_one(&record("http://a.com/1")).unwrap();
        store.insert_one(&record("http://a.com/1")).unwrap();
        assert_eq!(store.find_by_link("http://a.com/1").unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_collection_rejected() {
        assert!(matches!(
            SqliteDocumentStore::open_in_memory("bad name"),
            Err(StorageError::InvalidCollection(_))
        ));
    }

    #[test]
    fn test_open_file_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docs.db");
        {
            let store = SqliteDocumentStore::open(&path, "peoplecomcn").unwrap();
            store.insert_one(&record("http://a.com/1")).unwrap();
        }
        let store = SqliteDocumentStore::open(&path, "peoplecomcn").unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.collection(), "peoplecomcn");
    }

    #[test]
    fn test_read_only_open_counts_without_writing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docs.db");
        SqliteDocumentStore::open(&path, "peoplecomcn")
            .unwrap()
            .insert_one(&record("http://a.com/1"))
            .unwrap();

        let store = SqliteDocumentStore::open_read_only(&path, "peoplecomcn").unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.insert_one(&record("http://a.com/2")).is_err());
    }

    #[test]
    fn test_read_only_open_does_not_create_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docs.db");

        assert!(SqliteDocumentStore::open_read_only(&path, "peoplecomcn").is_err());
        assert!(!path.exists());
    }
}
