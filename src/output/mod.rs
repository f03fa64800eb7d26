//! Output module for run summaries and reports
//!
//! This module handles:
//! - Crawl, download and ingest counters
//! - Printing end-of-run summaries
//! - The `--stats` snapshot of queue and store contents

pub mod stats;

pub use stats::{
    load_statistics, print_crawl_summary, print_ingest_summary, print_statistics,
    CrawlStatistics, DownloadStatistics, IngestStatistics, QueueStatistics,
};
