//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client with a user agent and timeouts
//! - GET requests for article pages (decoded to text)
//! - GET requests for images (raw bytes)
//! - Error classification

use crate::config::UserAgentConfig;
use reqwest::{Client, Response};
use std::time::Duration;
use thiserror::Error;

/// Reasons a fetch can fail
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The request did not complete within the client timeout
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    /// The connection could not be established (DNS, refused, TLS)
    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    /// Any other transport or body-read failure
    #[error("Request failed for {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    /// The URL that failed
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Network { url, .. } => url,
        }
    }

    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if e.is_connect() {
            Self::Connect {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use article_harvester::config::UserAgentConfig;
/// use article_harvester::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version
    let user_agent = format!("{}/{}", config.crawler_name, config.crawler_version);

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and decodes its body as text
///
/// The charset announced in `Content-Type` is honored; UTF-8 is assumed
/// otherwise.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = send(client, url).await?;
    response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))
}

/// Fetches a resource as raw bytes
pub async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let response = send(client, url).await?;
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| FetchError::from_reqwest(url, e))
}

/// Sends a GET request and rejects non-success statuses
async fn send(client: &Client, url: &str) -> Result<Response, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}
