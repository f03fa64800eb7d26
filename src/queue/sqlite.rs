//! SQLite-backed message broker
//!
//! A single database file plays the role of the broker. The crawler and the
//! ingest worker may run as separate processes against the same file.

use crate::config::AckMode;
use crate::queue::schema::{initialize_schema, RECOVER_SQL};
use crate::queue::traits::{
    Delivery, DeliveryMode, MessageQueue, QueueDepth, QueueError, QueueResult,
};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Durable queue broker stored in SQLite
pub struct SqliteQueue {
    conn: Mutex<Connection>,
}

impl SqliteQueue {
    /// Opens (or creates) the broker database
    ///
    /// Messages already in the file are left as they are, so a publisher can
    /// open the broker while a consumer holds unacked deliveries. Call
    /// [`SqliteQueue::recover`] to apply restart semantics.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn open(path: &Path) -> QueueResult<Self> {
        let conn = Connection::open(path)?;

        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        Self::init(conn)
    }

    /// Opens an existing broker for inspection only
    ///
    /// No schema changes and no restart recovery are performed.
    pub fn open_read_only(path: &Path) -> QueueResult<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory broker
    pub fn open_in_memory() -> QueueResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> QueueResult<Self> {
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Brings the broker to its post-restart state
    ///
    /// Transient messages and non-durable queues are discarded and unacked
    /// deliveries become ready again. Only the consumer may call this, at
    /// startup, since it takes back every delivery still held.
    pub fn recover(&self) -> QueueResult<()> {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(RECOVER_SQL)?;
        tx.commit()?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_declared(conn: &Connection, queue: &str) -> QueueResult<()> {
        let exists: Option<i64> = conn
            .query_row("SELECT 1 FROM queues WHERE name = ?1", params![queue], |row| {
                row.get(0)
            })
            .optional()?;
        match exists {
            Some(_) => Ok(()),
            None => Err(QueueError::UnknownQueue(queue.to_string())),
        }
    }
}

impl MessageQueue for SqliteQueue {
    fn declare_queue(&self, name: &str, durable: bool) -> QueueResult<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR IGNORE INTO queues (name, durable, declared_at) VALUES (?1, ?2, ?3)",
            params![name, durable, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn publish(&self, queue: &str, body: &[u8], mode: DeliveryMode) -> QueueResult<()> {
        let conn = self.lock();
        Self::ensure_declared(&conn, queue)?;
        conn.execute(
            "INSERT INTO messages (queue, body, persistent, published_at) VALUES (?1, ?2, ?3, ?4)",
            params![queue, body, mode.is_persistent(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn receive(&self, queue: &str, mode: AckMode) -> QueueResult<Option<Delivery>> {
        let mut conn = self.lock();
        Self::ensure_declared(&conn, queue)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let next: Option<(i64, Vec<u8>, i64)> = tx
            .query_row(
                "SELECT id, body, delivery_count FROM messages
                 WHERE queue = ?1 AND state = 'ready'
                 ORDER BY id LIMIT 1",
                params![queue],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((id, body, delivery_count)) = next else {
            return Ok(None);
        };

        match mode {
            AckMode::Auto => {
                tx.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
            }
            AckMode::AfterFlush => {
                tx.execute(
                    "UPDATE messages SET state = 'unacked', delivery_count = delivery_count + 1
                     WHERE id = ?1",
                    params![id],
                )?;
            }
        }
        tx.commit()?;

        Ok(Some(Delivery {
            tag: id as u64,
            body,
            redelivered: delivery_count > 0,
        }))
    }

    fn ack(&self, tag: u64) -> QueueResult<()> {
        let conn = self.lock();
        let removed = conn.execute(
            "DELETE FROM messages WHERE id = ?1 AND state = 'unacked'",
            params![tag as i64],
        )?;
        if removed == 0 {
            return Err(QueueError::UnknownDelivery(tag));
        }
        Ok(())
    }

    fn reject(&self, tag: u64, requeue: bool) -> QueueResult<()> {
        let conn = self.lock();
        let changed = if requeue {
            conn.execute(
                "UPDATE messages SET state = 'ready' WHERE id = ?1 AND state = 'unacked'",
                params![tag as i64],
            )?
        } else {
            conn.execute(
                "DELETE FROM messages WHERE id = ?1 AND state = 'unacked'",
                params![tag as i64],
            )?
        };
        if changed == 0 {
            return Err(QueueError::UnknownDelivery(tag));
        }
        Ok(())
    }

    fn depth(&self, queue: &str) -> QueueResult<QueueDepth> {
        let conn = self.lock();
        Self::ensure_declared(&conn, queue)?;
        let (ready, unacked): (i64, i64) = conn.query_row(
            "SELECT
                COALESCE(SUM(state = 'ready'), 0),
                COALESCE(SUM(state = 'unacked'), 0)
             FROM messages WHERE queue = ?1",
            params![queue],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(QueueDepth {
            ready: ready as u64,
            unacked: unacked as u64,
        })
    }
}
