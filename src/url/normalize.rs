use crate::UrlError;
use url::Url;

/// Normalizes a URL to the form used for frontier bookkeeping
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Only `http` and `https` are accepted
/// 3. A host is required (the parser lowercases it)
/// 4. Dot segments are resolved and an empty path becomes `/`
/// 5. The fragment is removed
///
/// Query strings are kept: article pages are distinguished by path, but
/// search and paging links are distinguished by query.
///
/// # Examples
///
/// ```
/// use article_harvester::url::normalize_url;
///
/// let url = normalize_url("http://Society.People.com.cn/a/../b.html#top").unwrap();
/// assert_eq!(url.as_str(), "http://society.people.com.cn/b.html");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Returns the part of an href before any `#`
pub(crate) fn strip_fragment(href: &str) -> &str {
    match href.find('#') {
        Some(idx) => &href[..idx],
        None => href,
    }
}
