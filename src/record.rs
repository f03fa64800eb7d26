//! Document records extracted from article pages
//!
//! A [`DocumentRecord`] is built once by the page extractor, serialized to JSON
//! for the queue and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Date and source line of an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub date: String,
    pub source: String,
}

/// One extracted article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// URL the article was fetched from
    pub link: String,

    /// Article headline
    pub title: String,

    /// Publication date and source
    pub metadata: Metadata,

    /// Body text
    pub content: String,

    /// Image `src` values as they appear in the page, in document order
    pub images: Vec<String>,
}

impl DocumentRecord {
    /// Serializes the record to its interchange form (JSON)
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parses a record from its interchange form
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
