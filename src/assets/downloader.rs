//! Concurrent image downloader
//!
//! Fetches every collected image URL once, with a bounded number of fetches
//! in flight, and writes each body into the image directory.

use crate::crawler::{fetch_bytes, FetchError};
use crate::output::DownloadStatistics;
use crate::storage::StorageError;
use crate::url::asset_filename;
use crate::UrlError;
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Reasons one image was not saved
#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid image URL {url}: {source}")]
    InvalidUrl { url: String, source: UrlError },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Number of download workers for `distinct` images
///
/// ```
/// use article_harvester::assets::worker_count;
///
/// assert_eq!(worker_count(30, 7), 7);
/// assert_eq!(worker_count(30, 50), 30);
/// ```
pub fn worker_count(max_workers: usize, distinct: usize) -> usize {
    max_workers.min(distinct)
}

/// Downloads images into a directory with bounded concurrency
pub struct AssetDownloader {
    client: Client,
    image_dir: PathBuf,
    max_workers: usize,
}

impl AssetDownloader {
    pub fn new(client: Client, image_dir: impl Into<PathBuf>, max_workers: usize) -> Self {
        Self {
            client,
            image_dir: image_dir.into(),
            max_workers: max_workers.max(1),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Fetches each distinct URL once; failures are logged and counted
    pub async fn download_all<I>(&self, urls: I) -> DownloadStatistics
    where
        I: IntoIterator<Item = String>,
    {
        let urls: BTreeSet<String> = urls.into_iter().collect();
        let concurrency = worker_count(self.max_workers, urls.len());

        let mut stats = DownloadStatistics {
            requested: urls.len(),
            concurrency,
            ..Default::default()
        };

        if urls.is_empty() {
            tracing::info!("No images to download");
            return stats;
        }

        tracing::info!(
            "Downloading {} images with {} workers",
            urls.len(),
            concurrency
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut tasks = JoinSet::new();

        for url in urls {
            // The semaphore is never closed while this loop runs
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };

            let client = self.client.clone();
            let dir = self.image_dir.clone();
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);

            tasks.spawn(async move {
                let _permit = permit;

                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);

                let result = download_one(&client, &url, &dir).await;

                in_flight.fetch_sub(1, Ordering::SeqCst);
                (url, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(path))) => {
                    tracing::debug!("Saved image {}", path.display());
                    stats.downloaded += 1;
                }
                Ok((url, Err(e))) => {
                    tracing::warn!("Failed to download image {}: {}", url, e);
                    stats.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("Image download task panicked: {}", e);
                    stats.failed += 1;
                }
            }
        }

        stats.peak_in_flight = peak.load(Ordering::SeqCst);
        tracing::info!(
            "Image downloads finished: {} saved, {} failed",
            stats.downloaded,
            stats.failed
        );
        stats
    }
}

/// Fetches one image and writes it under its sanitized path
async fn download_one(client: &Client, url: &str, dir: &Path) -> Result<PathBuf, AssetError> {
    let filename = asset_filename(url).map_err(|source| AssetError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let body = fetch_bytes(client, url).await?;

    let path = dir.join(filename);
    tokio::fs::write(&path, body)
        .await
        .map_err(|source| StorageError::Write {
            path: path.display().to_string(),
            source,
        })?;
    Ok(path)
}
