//! Durable work queue between the crawler and the ingest worker
//!
//! This module provides:
//! - The [`MessageQueue`] broker interface
//! - A SQLite-file broker implementation
//! - The [`Publisher`] used by the crawler

mod publisher;
mod schema;
mod sqlite;
mod traits;

pub use crate::config::AckMode;
pub use publisher::{PublishError, Publisher};
pub use sqlite::SqliteQueue;
pub use traits::{Delivery, DeliveryMode, MessageQueue, QueueDepth, QueueError, QueueResult};

use crate::config::QueueConfig;
use std::path::Path;
use std::sync::Arc;

/// Opens the broker named by the configuration and declares its queue
///
/// Deliveries held by a running consumer are left untouched.
///
/// # Returns
///
/// * `Ok(Arc<dyn MessageQueue>)` - Broker ready for publishing and receiving
/// * `Err(QueueError)` - The broker could not be opened or declared
pub fn open_queue(config: &QueueConfig) -> QueueResult<Arc<dyn MessageQueue>> {
    let queue = SqliteQueue::open(Path::new(&config.database_path))?;
    queue.declare_queue(&config.name, true)?;
    tracing::debug!(
        "Opened queue '{}' at {}",
        config.name,
        config.database_path
    );
    Ok(Arc::new(queue))
}

/// Opens the broker for the consumer, recovering it first
///
/// Unacked deliveries left by a previous consumer become ready again and
/// transient messages are discarded.
pub fn open_consumer_queue(config: &QueueConfig) -> QueueResult<Arc<dyn MessageQueue>> {
    let queue = SqliteQueue::open(Path::new(&config.database_path))?;
    queue.recover()?;
    queue.declare_queue(&config.name, true)?;
    tracing::debug!(
        "Recovered queue '{}' at {}",
        config.name,
        config.database_path
    );
    Ok(Arc::new(queue))
}
