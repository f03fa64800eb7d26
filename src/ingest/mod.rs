//! Ingest side of the pipeline
//!
//! A long-running consumer that persists records published by the crawler.

mod worker;

pub use worker::{IngestWorker, Poll};

use crate::config::Config;
use crate::output::IngestStatistics;
use crate::queue::open_consumer_queue;
use crate::storage::Sink;
use crate::HarvestError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Runs the ingest worker until `interrupted` is set
///
/// Opening the queue, creating the output directory and opening the
/// document store are fatal; everything after that is logged and counted.
pub async fn run_ingest(
    config: &Config,
    interrupted: Arc<AtomicBool>,
) -> Result<IngestStatistics, HarvestError> {
    let queue = open_consumer_queue(&config.queue)?;
    let sink = Sink::from_config(config)?;

    tracing::info!(
        "Ingesting from '{}' into {:?} sink (ack mode {:?}, threshold {})",
        config.queue.name,
        sink.kind(),
        config.ingest.ack_mode,
        config.ingest.threshold
    );

    let mut worker = IngestWorker::new(
        queue,
        &config.queue.name,
        config.ingest.ack_mode,
        Duration::from_millis(config.ingest.poll_interval_ms),
        sink,
    )?;

    Ok(worker.run(&interrupted).await)
}
