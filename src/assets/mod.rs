//! Image download phase
//!
//! Runs once after the crawl phase, over every image URL the extractor
//! collected.

mod downloader;

pub use downloader::{worker_count, AssetDownloader, AssetError};
