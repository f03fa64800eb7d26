//! Queue traits and error types
//!
//! This module defines the broker interface shared by the publisher and the
//! ingest worker, along with its error and delivery types.

use crate::config::AckMode;
use thiserror::Error;

/// Errors that can occur during queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Queue not declared: {0}")]
    UnknownQueue(String),

    #[error("Unknown delivery tag: {0}")]
    UnknownDelivery(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Whether a message survives a broker restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Transient,
    Persistent,
}

impl DeliveryMode {
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent)
    }
}

/// A message handed to a consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Identifies the delivery for `ack`/`reject`
    pub tag: u64,

    pub body: Vec<u8>,

    /// True if this message was delivered before and returned to the queue
    pub redelivered: bool,
}

/// Message counts for one queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueDepth {
    pub ready: u64,
    pub unacked: u64,
}

impl QueueDepth {
    pub fn total(&self) -> u64 {
        self.ready + self.unacked
    }
}

/// Trait for message broker implementations
///
/// Implementations must be shareable across tasks; both the crawler and the
/// ingest worker hold one behind an `Arc`.
pub trait MessageQueue: Send + Sync {
    /// Declares a named queue, creating it if needed
    ///
    /// Declaring an existing queue is a no-op.
    fn declare_queue(&self, name: &str, durable: bool) -> QueueResult<()>;

    /// Appends a message to a declared queue
    fn publish(&self, queue: &str, body: &[u8], mode: DeliveryMode) -> QueueResult<()>;

    /// Takes the oldest ready message, if any
    ///
    /// With [`AckMode::Auto`] the message is removed on delivery. With
    /// [`AckMode::AfterFlush`] it stays unacked until [`ack`](Self::ack) or
    /// [`reject`](Self::reject) is called.
    fn receive(&self, queue: &str, mode: AckMode) -> QueueResult<Option<Delivery>>;

    /// Removes an unacked delivery
    fn ack(&self, tag: u64) -> QueueResult<()>;

    /// Returns an unacked delivery to the queue, or discards it
    fn reject(&self, tag: u64, requeue: bool) -> QueueResult<()>;

    /// Counts ready and unacked messages
    fn depth(&self, queue: &str) -> QueueResult<QueueDepth>;
}
