//! URL handling module for Article-Harvester
//!
//! This module provides URL normalization, allow-list matching, hyperlink
//! classification and the filename derivations used by the sinks.

mod domain;
mod matcher;
mod normalize;
mod sanitize;

use ::url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;
pub use sanitize::{
    asset_filename, disambiguated_record_filename, record_filename, RECORD_SUFFIX,
};

use normalize::strip_fragment;

/// Decides which hyperlinks stay inside the crawl region
///
/// The filter holds the allow-list of domains. Absolute links are kept only
/// when their host is allow-listed; rooted links (`/path`) are resolved
/// against the page that contains them and always kept.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    allowed_domains: Vec<String>,
}

impl LinkFilter {
    /// Creates a filter from allow-list patterns (`host` or `*.domain`)
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_domains: allowed_domains
                .into_iter()
                .map(|d| d.into().to_lowercase())
                .collect(),
        }
    }

    /// Returns true if the host matches any allow-list entry
    pub fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_domains
            .iter()
            .any(|pattern| matches_wildcard(pattern, host))
    }

    /// Classifies a raw `href` found on `page_url`
    ///
    /// # Rules
    ///
    /// 1. The fragment (`#...`) is stripped; an empty remainder is rejected
    /// 2. `//host/path` takes the page's scheme and is then treated as absolute
    /// 3. `/path` is resolved against the page's scheme and host and accepted
    /// 4. An absolute `http(s)` URL is accepted only if its host is allow-listed
    /// 5. Everything else (`mailto:`, `javascript:`, `page.html`, ...) is rejected
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The normalized absolute URL
    /// * `None` - The link is out of scope or malformed
    ///
    /// # Examples
    ///
    /// ```
    /// use article_harvester::url::LinkFilter;
    /// use url::Url;
    ///
    /// let filter = LinkFilter::new(["society.people.com.cn", "legal.people.com.cn"]);
    /// let page = Url::parse("http://society.people.com.cn/y").unwrap();
    ///
    /// assert_eq!(
    ///     filter.classify("/a/b#frag", &page).as_deref(),
    ///     Some("http://society.people.com.cn/a/b")
    /// );
    /// assert!(filter.classify("http://other.com/x", &page).is_none());
    /// ```
    pub fn classify(&self, raw_href: &str, page_url: &Url) -> Option<String> {
        let href = strip_fragment(raw_href.trim());
        if href.is_empty() {
            return None;
        }

        if href.starts_with("//") {
            let absolute = format!("{}:{}", page_url.scheme(), href);
            return self.accept_absolute(&absolute);
        }

        if href.starts_with('/') {
            return resolve_rooted(href, page_url);
        }

        self.accept_absolute(href)
    }

    /// Accepts an absolute href if it is http(s) and its host is allow-listed
    fn accept_absolute(&self, href: &str) -> Option<String> {
        let url = normalize_url(href).ok()?;
        let host = extract_domain(&url)?;

        if self.is_allowed_host(&host) {
            Some(url.into())
        } else {
            tracing::trace!("Rejected out-of-scope link: {}", href);
            None
        }
    }
}

/// Resolves a rooted path against the page's origin
///
/// Resolution must stay on the page's host. The URL parser treats `\` like
/// `/` for http(s), so `/\other.com` would otherwise escape to another host.
fn resolve_rooted(href: &str, page_url: &Url) -> Option<String> {
    let joined = page_url.join(href).ok()?;
    if joined.host_str() != page_url.host_str() || joined.port() != page_url.port() {
        tracing::trace!("Rejected rooted link that changes host: {}", href);
        return None;
    }
    normalize_url(joined.as_str()).ok().map(Into::into)
}
