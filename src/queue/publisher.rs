use crate::queue::traits::{DeliveryMode, MessageQueue, QueueError, QueueResult};
use crate::record::DocumentRecord;
use std::sync::Arc;
use thiserror::Error;

/// A record the broker did not accept
#[derive(Debug, Error)]
#[error("Failed to publish {link} to queue '{queue}': {source}")]
pub struct PublishError {
    pub link: String,
    pub queue: String,
    #[source]
    pub source: QueueError,
}

/// Sends extracted records to the durable work queue
///
/// Fire-and-forget: a successful return means the broker stored the message,
/// not that anyone consumed it.
pub struct Publisher {
    queue: Arc<dyn MessageQueue>,
    queue_name: String,
}

impl Publisher {
    /// Declares `queue_name` as durable and returns a publisher for it
    pub fn new(queue: Arc<dyn MessageQueue>, queue_name: &str) -> QueueResult<Self> {
        queue.declare_queue(queue_name, true)?;
        Ok(Self {
            queue,
            queue_name: queue_name.to_string(),
        })
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Serializes `record` and publishes it persistently
    pub fn publish(&self, record: &DocumentRecord) -> Result<(), PublishError> {
        let result = record
            .to_json()
            .map_err(QueueError::from)
            .and_then(|body| {
                self.queue
                    .publish(&self.queue_name, &body, DeliveryMode::Persistent)
            });

        result.map_err(|source| PublishError {
            link: record.link.clone(),
            queue: self.queue_name.clone(),
            source,
        })
    }
}
