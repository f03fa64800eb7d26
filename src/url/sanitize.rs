//! Filesystem-safe names derived from URLs

use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Suffix appended to every record dump filename
pub const RECORD_SUFFIX: &str = "html.json";

/// Derives the dump filename for a record link
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, then [`RECORD_SUFFIX`]
/// is appended.
///
/// # Examples
///
/// ```
/// use article_harvester::url::record_filename;
///
/// assert_eq!(record_filename("http://a.com/b?c=1"), "http___a_com_b_c_1html.json");
/// ```
pub fn record_filename(link: &str) -> String {
    let mut name: String = link
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    name.push_str(RECORD_SUFFIX);
    name
}

/// Derives a dump filename that cannot collide with another link's
///
/// The first 8 hex digits of the link's SHA-256 are inserted before the
/// suffix.
pub fn disambiguated_record_filename(link: &str) -> String {
    let base = record_filename(link);
    let stem = &base[..base.len() - RECORD_SUFFIX.len()];
    let digest = hex::encode(Sha256::digest(link.as_bytes()));
    format!("{}_{}{}", stem, &digest[..8], RECORD_SUFFIX)
}

/// Derives the on-disk filename for a downloaded image
///
/// The URL path with every `/` replaced by `_`.
pub fn asset_filename(image_url: &str) -> Result<String, UrlError> {
    let url = Url::parse(image_url).map_err(|e| UrlError::Parse(e.to_string()))?;
    Ok(url.path().replace('/', "_"))
}
