/// URL state definitions for tracking crawl progress
///
/// Every URL the frontier learns about moves through
/// `Unvisited -> InFlight -> Visited` exactly once.
use std::fmt;

/// Represents where a URL is in the frontier lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Discovered and waiting in the frontier queue
    Unvisited,

    /// Handed to the page extractor, not yet completed
    InFlight,

    /// Processed (successfully or not); never revisited
    Visited,
}

impl UrlState {
    /// Returns true if `next` is the single legal successor of this state
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Unvisited, Self::InFlight) | (Self::InFlight, Self::Visited)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvisited => "unvisited",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How processing of one visited page ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    /// Record extracted and handed to the queue
    Published,

    /// Network failure or non-success status; no record, no links
    FetchFailed,

    /// Required article elements missing; no record, no links
    ParseFailed,

    /// Record extracted but the broker refused it; links still followed
    PublishFailed,
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Published => "published",
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
            Self::PublishFailed => "publish_failed",
        };
        f.write_str(s)
    }
}
