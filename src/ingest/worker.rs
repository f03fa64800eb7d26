//! Ingest worker - queue consumer loop
//!
//! This module contains the loop that takes records off the work queue and
//! hands them to a sink, including:
//! - Polling the broker at a fixed interval when the queue is empty
//! - Dropping message bodies that are not records
//! - Acknowledging deliveries according to the configured ack mode
//! - Draining the sink's buffer on shutdown

use crate::config::AckMode;
use crate::output::IngestStatistics;
use crate::queue::{Delivery, MessageQueue, QueueResult};
use crate::record::DocumentRecord;
use crate::storage::{RecordSink, Settlement};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// What one poll of the queue produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// The queue was empty
    Idle,

    /// A message was handled without persistence failures
    Delivered,

    /// A message was handled and some record failed to persist
    Failed,
}

/// Consumes records from the work queue into a sink
pub struct IngestWorker<S: RecordSink> {
    queue: Arc<dyn MessageQueue>,
    queue_name: String,
    ack_mode: AckMode,
    poll_interval: Duration,
    sink: S,
    stats: IngestStatistics,
}

impl<S: RecordSink> IngestWorker<S> {
    /// Creates a worker, declaring `queue_name` as durable
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        queue_name: &str,
        ack_mode: AckMode,
        poll_interval: Duration,
        sink: S,
    ) -> QueueResult<Self> {
        queue.declare_queue(queue_name, true)?;
        Ok(Self {
            queue,
            queue_name: queue_name.to_string(),
            ack_mode,
            poll_interval,
            sink,
            stats: IngestStatistics::default(),
        })
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn stats(&self) -> &IngestStatistics {
        &self.stats
    }

    /// Receives and handles at most one message
    pub fn poll_once(&mut self) -> QueueResult<Poll> {
        match self.queue.receive(&self.queue_name, self.ack_mode)? {
            Some(delivery) => Ok(self.handle_delivery(delivery)),
            None => Ok(Poll::Idle),
        }
    }

    /// Decodes one delivery and hands it to the sink
    pub fn handle_delivery(&mut self, delivery: Delivery) -> Poll {
        self.stats.received += 1;

        let record = match DocumentRecord::from_json(&delivery.body) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Dropping undecodable message {}: {}", delivery.tag, e);
                self.stats.undecodable += 1;
                if self.ack_mode == AckMode::AfterFlush {
                    if let Err(e) = self.queue.reject(delivery.tag, false) {
                        tracing::warn!("Failed to discard message {}: {}", delivery.tag, e);
                    }
                }
                return Poll::Delivered;
            }
        };

        if delivery.redelivered {
            tracing::debug!("Redelivered record {}", record.link);
        } else {
            tracing::debug!("Received record {}", record.link);
        }

        let settlement = self.sink.accept(delivery.tag, record);
        if self.settle(settlement) {
            Poll::Failed
        } else {
            Poll::Delivered
        }
    }

    /// Flushes the sink and returns the session counters
    pub fn finish(&mut self) -> IngestStatistics {
        let buffered = self.sink.buffered();
        if buffered > 0 {
            tracing::info!("Draining {} buffered records", buffered);
        }
        let settlement = self.sink.flush();
        self.settle(settlement);
        self.stats.clone()
    }

    /// Runs until `interrupted` is set, then drains the sink
    pub async fn run(&mut self, interrupted: &AtomicBool) -> IngestStatistics {
        tracing::info!(
            "Waiting for messages on '{}'. To exit press CTRL+C",
            self.queue_name
        );

        while !interrupted.load(Ordering::SeqCst) {
            match self.poll_once() {
                Ok(Poll::Delivered) => tokio::task::yield_now().await,
                Ok(Poll::Idle) | Ok(Poll::Failed) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    tracing::warn!("Receive from '{}' failed: {}", self.queue_name, e);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        tracing::info!("Ingest worker stopping");
        self.finish()
    }

    /// Records a settlement and acknowledges it in after-flush mode
    ///
    /// Returns true if any record failed to persist.
    fn settle(&mut self, settlement: Settlement) -> bool {
        self.stats.files_written += settlement.files_written;
        self.stats.documents_stored += settlement.documents_stored;
        self.stats.persist_failures += settlement.failed.len() as u64;

        if self.ack_mode == AckMode::AfterFlush && !settlement.is_empty() {
            for tag in &settlement.persisted {
                match self.queue.ack(*tag) {
                    Ok(()) => self.stats.acked += 1,
                    Err(e) => tracing::warn!("Failed to ack message {}: {}", tag, e),
                }
            }
            for tag in &settlement.failed {
                match self.queue.reject(*tag, true) {
                    Ok(()) => self.stats.rejected += 1,
                    Err(e) => tracing::warn!("Failed to requeue message {}: {}", tag, e),
                }
            }
        }

        !settlement.failed.is_empty()
    }
}
