//! Run statistics and their console rendering
//!
//! Counters are accumulated by the crawl loop, the asset downloader and the
//! ingest worker, then printed once at the end of a run.

use crate::config::Config;
use crate::queue::{MessageQueue, QueueDepth, SqliteQueue};
use crate::state::PageOutcome;
use crate::storage::{DocumentStore, SqliteDocumentStore};
use crate::url::RECORD_SUFFIX;
use crate::HarvestError;
use std::path::Path;
use std::time::Duration;

/// Counters for one crawl phase
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Pages taken from the frontier (the entry page is not counted)
    pub pages_visited: u64,

    /// Records accepted by the queue
    pub records_published: u64,

    pub fetch_failures: u64,
    pub parse_failures: u64,
    pub publish_failures: u64,

    /// URLs added to the frontier, including those seeded from the entry page
    pub links_queued: u64,

    /// Distinct image URLs collected
    pub images_collected: usize,

    /// True if the crawl stopped on Ctrl-C rather than frontier exhaustion
    pub interrupted: bool,

    pub elapsed: Duration,
}

impl CrawlStatistics {
    /// Counts one processed page
    pub fn record(&mut self, outcome: PageOutcome) {
        self.pages_visited += 1;
        match outcome {
            PageOutcome::Published => self.records_published += 1,
            PageOutcome::FetchFailed => self.fetch_failures += 1,
            PageOutcome::ParseFailed => self.parse_failures += 1,
            PageOutcome::PublishFailed => self.publish_failures += 1,
        }
    }

    /// Pages per second over the whole phase
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_visited as f64 / secs
        } else {
            0.0
        }
    }
}

/// Counters for one asset download phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStatistics {
    /// Distinct image URLs handed to the downloader
    pub requested: usize,

    pub downloaded: usize,
    pub failed: usize,

    /// Worker count used: `min(max_workers, requested)`
    pub concurrency: usize,

    /// Highest number of fetches observed in flight at once
    pub peak_in_flight: usize,
}

/// Counters for one ingest worker session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStatistics {
    /// Messages taken from the queue
    pub received: u64,

    /// Messages dropped because their body was not a record
    pub undecodable: u64,

    pub files_written: u64,
    pub documents_stored: u64,

    /// Records a sink failed to persist
    pub persist_failures: u64,

    /// Deliveries acknowledged or rejected (after-flush mode only)
    pub acked: u64,
    pub rejected: u64,
}

/// Snapshot of the pipeline's persistent state, for `--stats`
#[derive(Debug, Clone)]
pub struct QueueStatistics {
    pub queue_name: String,
    pub depth: QueueDepth,

    /// Documents in the store, when one is configured
    pub documents: Option<u64>,

    /// Record dump files present in the output directory
    pub record_files: usize,
}

/// Loads queue depth, document count and dump-file count
///
/// The broker and the document store are opened read-only so a running
/// worker's unacked deliveries are left alone and nothing is created. A
/// document store file that does not exist yet counts as empty.
pub fn load_statistics(config: &Config) -> Result<QueueStatistics, HarvestError> {
    let queue = SqliteQueue::open_read_only(Path::new(&config.queue.database_path))?;
    let depth = queue.depth(&config.queue.name)?;

    let documents = match &config.document_store {
        Some(store_config) => {
            let path = Path::new(&store_config.database_path);
            if path.exists() {
                let store = SqliteDocumentStore::open_read_only(path, &store_config.collection)?;
                Some(store.count()?)
            } else {
                Some(0)
            }
        }
        None => None,
    };

    let record_files = count_record_files(Path::new(&config.ingest.output_dir));

    Ok(QueueStatistics {
        queue_name: config.queue.name.clone(),
        depth,
        documents,
        record_files,
    })
}

fn count_record_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(RECORD_SUFFIX))
        .count()
}

/// Prints the end-of-run crawl and download summary
pub fn print_crawl_summary(crawl: &CrawlStatistics, downloads: &DownloadStatistics) {
    println!("=== Crawl Summary ===\n");

    if crawl.interrupted {
        println!("Crawl interrupted; frontier not exhausted.\n");
    }

    println!("Pages:");
    println!("  Visited: {}", crawl.pages_visited);
    println!("  Published: {}", crawl.records_published);
    println!("  Fetch failures: {}", crawl.fetch_failures);
    println!("  Parse failures: {}", crawl.parse_failures);
    println!("  Publish failures: {}", crawl.publish_failures);
    println!("  Links queued: {}", crawl.links_queued);
    println!(
        "  Duration: {:.1}s ({:.2} pages/sec)",
        crawl.elapsed.as_secs_f64(),
        crawl.rate()
    );
    println!();

    println!("Images:");
    println!("  Collected: {}", crawl.images_collected);
    println!("  Downloaded: {}", downloads.downloaded);
    println!("  Failed: {}", downloads.failed);
    println!(
        "  Workers: {} (peak in flight: {})",
        downloads.concurrency, downloads.peak_in_flight
    );
    println!();

    println!(
        "Total: {}, Image downloaded: {}",
        crawl.pages_visited, downloads.downloaded
    );
}

/// Prints the ingest worker's session counters
pub fn print_ingest_summary(stats: &IngestStatistics) {
    println!("=== Ingest Summary ===\n");
    println!("  Received: {}", stats.received);
    println!("  Undecodable: {}", stats.undecodable);
    println!("  Files written: {}", stats.files_written);
    println!("  Documents stored: {}", stats.documents_stored);
    println!("  Persist failures: {}", stats.persist_failures);
    if stats.acked > 0 || stats.rejected > 0 {
        println!("  Acked: {}", stats.acked);
        println!("  Rejected: {}", stats.rejected);
    }
}

/// Prints the `--stats` snapshot
pub fn print_statistics(stats: &QueueStatistics) {
    println!("=== Pipeline Statistics ===\n");

    println!("Queue '{}':", stats.queue_name);
    println!("  Ready: {}", stats.depth.ready);
    println!("  Unacked: {}", stats.depth.unacked);
    println!();

    println!("Persisted:");
    println!("  Record files: {}", stats.record_files);
    match stats.documents {
        Some(count) => println!("  Documents: {}", count),
        None => println!("  Documents: (no document store configured)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    fn stats_config(dir: &Path) -> Config {
        parse_config(&format!(
            r#"
            [crawler]
            entry-url = "http://society.people.com.cn/"
            allowed-domains = ["*.people.com.cn"]

            [queue]
            database-path = "{dir}/queue.db"

            [ingest]
            output-dir = "{dir}/records"

            [document-store]
            database-path = "{dir}/docs.db"
            collection = "peoplecomcn"
            "#,
            dir = dir.display()
        ))
        .unwrap()
    }

    #[test]
    fn test_record_outcomes() {
        let mut stats = CrawlStatistics::default();
        stats.record(PageOutcome::Published);
        stats.record(PageOutcome::Published);
        stats.record(PageOutcome::FetchFailed);
        stats.record(PageOutcome::ParseFailed);
        stats.record(PageOutcome::PublishFailed);

        assert_eq!(stats.pages_visited, 5);
        assert_eq!(stats.records_published, 2);
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(stats.publish_failures, 1);
    }

    #[test]
    fn test_rate_with_zero_elapsed() {
        let stats = CrawlStatistics {
            pages_visited: 10,
            ..Default::default()
        };
        assert_eq!(stats.rate(), 0.0);
    }

    #[test]
    fn test_count_record_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("http___a_com_1html.json"), "{}").unwrap();
        std::fs::write(dir.path().join("http___a_com_2html.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        assert_eq!(count_record_files(dir.path()), 2);
        assert_eq!(count_record_files(&dir.path().join("missing")), 0);
    }

    #[test]
    fn test_load_statistics_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let config = stats_config(dir.path());
        let queue = SqliteQueue::open(&dir.path().join("queue.db")).unwrap();
        queue.declare_queue("task_queue", true).unwrap();

        let stats = load_statistics(&config).unwrap();

        assert_eq!(stats.documents, Some(0));
        assert_eq!(stats.depth, QueueDepth::default());
        assert!(!dir.path().join("docs.db").exists());
    }

    #[test]
    fn test_load_statistics_counts_documents() {
        let dir = TempDir::new().unwrap();
        let config = stats_config(dir.path());
        let queue = SqliteQueue::open(&dir.path().join("queue.db")).unwrap();
        queue.declare_queue("task_queue", true).unwrap();
        let store = SqliteDocumentStore::open(&dir.path().join("docs.db"), "peoplecomcn").unwrap();
        store
            .insert_one(&crate::record::DocumentRecord {
                link: "http://society.people.com.cn/n1/1.html".to_string(),
                title: "t".to_string(),
                metadata: crate::record::Metadata {
                    date: "d".to_string(),
                    source: "s".to_string(),
                },
                content: "c".to_string(),
                images: vec![],
            })
            .unwrap();

        assert_eq!(load_statistics(&config).unwrap().documents, Some(1));
    }
}
