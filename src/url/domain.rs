use url::Url;

/// Extracts the lowercase host from a URL
///
/// The port is not part of the result, so allow-list entries never need to
/// mention one.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use article_harvester::url::extract_domain;
///
/// let url = Url::parse("http://legal.people.com.cn/n1/index.html").unwrap();
/// assert_eq!(extract_domain(&url), Some("legal.people.com.cn".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}
