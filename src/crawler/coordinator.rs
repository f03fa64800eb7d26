//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier from the entry page
//! - Extracting and publishing one page at a time
//! - Following in-scope links breadth-first
//! - Stopping cleanly on Ctrl-C
//! - Running the image download phase afterwards

use crate::assets::AssetDownloader;
use crate::config::Config;
use crate::crawler::extractor::{ArticleSelectors, ExtractError, PageExtractor};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::frontier::Frontier;
use crate::crawler::images::ImageSet;
use crate::output::{CrawlStatistics, DownloadStatistics};
use crate::queue::{open_queue, MessageQueue, Publisher};
use crate::state::PageOutcome;
use crate::url::{normalize_url, LinkFilter};
use crate::HarvestError;
use reqwest::Client;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything a finished crawl run reports
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub crawl: CrawlStatistics,
    pub downloads: DownloadStatistics,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    entry_url: String,
    extractor: PageExtractor,
    publisher: Publisher,
    frontier: Frontier,
    stats: CrawlStatistics,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `queue` - Broker the extracted records are published to
    /// * `images` - Shared set the extractor adds image URLs to
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - Bad entry URL or selectors, HTTP client
    ///   construction failed, or the queue could not be declared
    pub fn new(
        config: &Config,
        queue: Arc<dyn MessageQueue>,
        images: ImageSet,
    ) -> Result<Self, HarvestError> {
        let entry_url = normalize_url(&config.crawler.entry_url)?.to_string();

        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.fetch_timeout_secs),
        )?;
        let selectors = ArticleSelectors::from_config(&config.extract)?;
        let filter = LinkFilter::new(config.crawler.allowed_domains.iter().cloned());
        let publisher = Publisher::new(queue, &config.queue.name)?;

        Ok(Self {
            frontier: Frontier::new(&entry_url),
            entry_url,
            extractor: PageExtractor::new(client, selectors, filter, images),
            publisher,
            stats: CrawlStatistics::default(),
        })
    }

    /// The HTTP client shared with the download phase
    pub fn client(&self) -> &Client {
        self.extractor.client()
    }

    /// Runs the crawl loop until the frontier is exhausted or `interrupted`
    /// is set
    ///
    /// A page already being processed when the flag is set is finished first.
    pub async fn run(&mut self, interrupted: &AtomicBool) -> CrawlStatistics {
        tracing::info!("Starting crawl at {}", self.entry_url);
        let start_time = Instant::now();

        self.seed().await;

        loop {
            if interrupted.load(Ordering::SeqCst) {
                tracing::info!(
                    "Interrupted, stopping with {} URLs still queued",
                    self.frontier.pending_count()
                );
                self.stats.interrupted = true;
                break;
            }

            let Some(url) = self.frontier.next() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            tracing::debug!("Processing URL: {}", url);
            let (outcome, links) = self.process_url(&url).await;
            let queued = self.frontier.complete(&url, links);
            tracing::debug!("{}: {}, {} new links", url, outcome, queued);

            self.stats.links_queued += queued as u64;
            self.stats.record(outcome);

            // Progress reporting every 10 pages
            if self.stats.pages_visited % 10 == 0 {
                let elapsed = start_time.elapsed();
                let rate = self.stats.pages_visited as f64 / elapsed.as_secs_f64();
                tracing::info!(
                    "Progress: {} pages visited, {} in frontier, {:.2} pages/sec",
                    self.stats.pages_visited,
                    self.frontier.pending_count(),
                    rate
                );
            }
        }

        self.stats.images_collected = self.extractor.images().len();
        self.stats.elapsed = start_time.elapsed();

        tracing::info!(
            "Crawl finished: {} pages visited, {} published in {:?}",
            self.stats.pages_visited,
            self.stats.records_published,
            self.stats.elapsed
        );

        self.stats.clone()
    }

    /// Seeds the frontier with the entry page's in-scope links
    async fn seed(&mut self) {
        match self.extractor.discover_links(&self.entry_url).await {
            Ok(links) => {
                let queued = self.frontier.enqueue(links);
                self.stats.links_queued += queued as u64;
                tracing::info!("Seeded frontier with {} URLs from entry page", queued);
            }
            Err(e) => {
                tracing::warn!("Entry page {} yielded no links: {}", self.entry_url, e);
            }
        }
    }

    /// Extracts and publishes one page
    ///
    /// Returns the outcome and the links to follow (none unless a record was
    /// extracted).
    async fn process_url(&self, url: &str) -> (PageOutcome, Vec<String>) {
        match self.extractor.extract(url).await {
            Ok(page) => {
                let outcome = match self.publisher.publish(&page.record) {
                    Ok(()) => {
                        tracing::info!("Published {}", page.record.link);
                        PageOutcome::Published
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        PageOutcome::PublishFailed
                    }
                };
                (outcome, page.links)
            }
            Err(ExtractError::Fetch(e)) => {
                tracing::warn!("Skipping {}: {}", e.url(), e);
                (PageOutcome::FetchFailed, Vec::new())
            }
            Err(e @ ExtractError::Parse { .. }) => {
                tracing::warn!("Skipping {}: {}", url, e);
                (PageOutcome::ParseFailed, Vec::new())
            }
        }
    }
}

/// Runs a complete crawl followed by the image download phase
///
/// Fatal before any crawling: image directory creation, queue open/declare,
/// HTTP client and selector construction. The download phase runs whether
/// the crawl ended by exhaustion or interrupt.
pub async fn run_crawl(
    config: &Config,
    interrupted: Arc<AtomicBool>,
) -> Result<CrawlReport, HarvestError> {
    let image_dir = Path::new(&config.assets.image_dir);
    std::fs::create_dir_all(image_dir).map_err(|source| HarvestError::CreateDir {
        path: image_dir.display().to_string(),
        source,
    })?;

    let queue = open_queue(&config.queue)?;
    let images = ImageSet::new();
    let mut coordinator = Coordinator::new(config, queue, images.clone())?;

    let crawl = coordinator.run(&interrupted).await;

    let downloader = AssetDownloader::new(
        coordinator.client().clone(),
        image_dir,
        config.assets.max_workers,
    );
    let downloads = downloader.download_all(images.snapshot()).await;

    Ok(CrawlReport { crawl, downloads })
}
