//! Broker schema definitions

/// SQL schema for the broker database
pub const SCHEMA_SQL: &str = r#"
-- Declared queues
CREATE TABLE IF NOT EXISTS queues (
    name TEXT PRIMARY KEY,
    durable INTEGER NOT NULL,
    declared_at TEXT NOT NULL
);

-- Messages; state is 'ready' or 'unacked'
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    queue TEXT NOT NULL REFERENCES queues(name) ON DELETE CASCADE,
    body BLOB NOT NULL,
    persistent INTEGER NOT NULL,
    state TEXT NOT NULL DEFAULT 'ready',
    delivery_count INTEGER NOT NULL DEFAULT 0,
    published_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_queue_state ON messages(queue, state, id);
"#;

/// Brings the broker back to its post-restart state
///
/// Transient messages and non-durable queues are discarded; unacked
/// deliveries become ready again.
pub const RECOVER_SQL: &str = r#"
DELETE FROM messages WHERE persistent = 0;
DELETE FROM messages WHERE queue IN (SELECT name FROM queues WHERE durable = 0);
DELETE FROM queues WHERE durable = 0;
UPDATE messages SET state = 'ready' WHERE state = 'unacked';
"#;

/// Initializes the broker schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
