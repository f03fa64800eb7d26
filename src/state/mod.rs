//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: the per-URL lifecycle inside the frontier (unvisited, in flight, visited)
//! - `PageOutcome`: how a visited page ended (published, skipped, dropped)

mod url_state;

// Re-export main types
pub use url_state::{PageOutcome, UrlState};
