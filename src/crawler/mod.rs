//! Crawler module for page fetching and article extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeouts
//! - Article extraction and link discovery
//! - The breadth-first frontier
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod images;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use extractor::{ArticleSelectors, ExtractError, ExtractedPage, PageExtractor};
pub use fetcher::{build_http_client, fetch_bytes, fetch_page, FetchError};
pub use frontier::Frontier;
pub use images::ImageSet;
