//! Article extraction
//!
//! This module turns one fetched page into:
//! - A [`DocumentRecord`] built from the configured CSS selectors
//! - The set of in-scope links found in its anchors
//! - Absolute image URLs, added to the shared [`ImageSet`]
//!
//! Parsing happens in synchronous helpers so the non-`Send` document tree is
//! never held across an await point.

use crate::config::ExtractConfig;
use crate::crawler::fetcher::{fetch_page, FetchError};
use crate::crawler::images::ImageSet;
use crate::record::{DocumentRecord, Metadata};
use crate::url::LinkFilter;
use crate::ConfigError;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Reasons a page yields no record
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

impl ExtractError {
    fn parse(url: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// A successfully extracted article page
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub record: DocumentRecord,

    /// Distinct in-scope links, in document order
    pub links: Vec<String>,
}

/// Compiled selectors for one site layout
#[derive(Debug, Clone)]
pub struct ArticleSelectors {
    title: Selector,
    byline: Selector,
    content: Selector,
    image: Selector,
    anchor: Selector,
    image_prefix: String,
}

impl ArticleSelectors {
    /// Compiles the `[extract]` selectors
    pub fn from_config(config: &ExtractConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile(&config.title_selector)?,
            byline: compile(&config.byline_selector)?,
            content: compile(&config.content_selector)?,
            image: compile(&config.image_selector)?,
            anchor: compile("a[href]")?,
            image_prefix: config.image_prefix.clone(),
        })
    }
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Fetches pages and extracts article records from them
pub struct PageExtractor {
    client: Client,
    selectors: ArticleSelectors,
    filter: LinkFilter,
    images: ImageSet,
}

impl PageExtractor {
    pub fn new(
        client: Client,
        selectors: ArticleSelectors,
        filter: LinkFilter,
        images: ImageSet,
    ) -> Self {
        Self {
            client,
            selectors,
            filter,
            images,
        }
    }

    /// The shared image URL set this extractor feeds
    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    /// The HTTP client used for page fetches
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches `url` and extracts its article record and in-scope links
    ///
    /// # Errors
    ///
    /// * `ExtractError::Fetch` - Network failure, timeout or non-success status
    /// * `ExtractError::Parse` - A required element is missing or the byline
    ///   is not of the form `date | source`
    pub async fn extract(&self, url: &str) -> Result<ExtractedPage, ExtractError> {
        let page_url = Url::parse(url).map_err(|e| ExtractError::parse(url, e.to_string()))?;
        let body = fetch_page(&self.client, url).await?;

        let parsed = parse_article(&body, &page_url, &self.selectors, &self.filter)
            .map_err(|message| ExtractError::parse(url, message))?;

        let added = self.images.extend(parsed.image_urls);
        if added > 0 {
            tracing::debug!("Collected {} new image URLs from {}", added, url);
        }

        Ok(ExtractedPage {
            record: parsed.record,
            links: parsed.links,
        })
    }

    /// Fetches `url` and returns only its in-scope links
    ///
    /// Used for index pages that carry no article body.
    pub async fn discover_links(&self, url: &str) -> Result<Vec<String>, ExtractError> {
        let page_url = Url::parse(url).map_err(|e| ExtractError::parse(url, e.to_string()))?;
        let body = fetch_page(&self.client, url).await?;
        let document = Html::parse_document(&body);
        Ok(collect_links(
            &document,
            &page_url,
            &self.selectors.anchor,
            &self.filter,
        ))
    }
}

/// Everything pulled out of one article document
#[derive(Debug)]
struct ParsedArticle {
    record: DocumentRecord,
    links: Vec<String>,
    image_urls: Vec<String>,
}

/// Parses an article document
///
/// Returns a message describing the first missing element on failure.
fn parse_article(
    html: &str,
    page_url: &Url,
    selectors: &ArticleSelectors,
    filter: &LinkFilter,
) -> Result<ParsedArticle, String> {
    let document = Html::parse_document(html);

    let title = select_text(&document, &selectors.title).ok_or("title element not found")?;
    let byline =
        select_text(&document, &selectors.byline).ok_or("date/source element not found")?;
    let (date, source) = split_byline(&byline)
        .ok_or_else(|| format!("date/source line is not 'date | source': {:?}", byline))?;
    let content =
        select_text(&document, &selectors.content).ok_or("content element not found")?;

    let (images, image_urls) = match extract_images(&document, page_url, selectors) {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!("Dropping image references for {}: {}", page_url, e);
            (Vec::new(), Vec::new())
        }
    };

    let links = collect_links(&document, page_url, &selectors.anchor, filter);

    Ok(ParsedArticle {
        record: DocumentRecord {
            link: page_url.to_string(),
            title,
            metadata: Metadata { date, source },
            content,
            images,
        },
        links,
        image_urls,
    })
}

/// Trimmed text of the first element matching `selector`
fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
}

/// Splits `"2021年06月01日08:21 | 来源：人民网"` into its two trimmed halves
fn split_byline(byline: &str) -> Option<(String, String)> {
    let mut parts = byline.split('|');
    let date = parts.next()?.trim().to_string();
    let source = parts.next()?.trim().to_string();
    if parts.next().is_some() {
        return None;
    }
    Some((date, source))
}

/// Collects image `src` values and their absolute URLs
///
/// Fails as a whole if any reference cannot be resolved.
fn extract_images(
    document: &Html,
    page_url: &Url,
    selectors: &ArticleSelectors,
) -> Result<(Vec<String>, Vec<String>), String> {
    let mut sources = Vec::new();
    let mut absolute = Vec::new();

    for element in document.select(&selectors.image) {
        let Some(src) = element.value().attr("src") else {
            continue;
        };
        let src = src.trim();
        if !src.starts_with(&selectors.image_prefix) {
            continue;
        }

        let resolved = page_url
            .join(src)
            .map_err(|e| format!("cannot resolve image {:?}: {}", src, e))?;
        sources.push(src.to_string());
        absolute.push(resolved.to_string());
    }

    Ok((sources, absolute))
}

/// Runs every anchor through the link filter, keeping first occurrences
fn collect_links(
    document: &Html,
    page_url: &Url,
    anchor: &Selector,
    filter: &LinkFilter,
) -> Vec<String> {
    let mut seen = HashSet::new();
    document
        .select(anchor)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| filter.classify(href, page_url))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
