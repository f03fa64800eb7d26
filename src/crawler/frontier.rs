//! Crawl frontier
//!
//! Strict FIFO queue of unvisited URLs plus the visited set. A URL is handed
//! out at most once for the lifetime of the frontier.

use crate::state::UrlState;
use std::collections::{HashSet, VecDeque};

/// Breadth-first frontier with at-most-once visitation
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<String>,
    pending: HashSet<String>,
    in_flight: HashSet<String>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier whose visited set holds only the entry URL
    pub fn new(entry_url: &str) -> Self {
        let mut frontier = Self::default();
        frontier.visited.insert(entry_url.to_string());
        frontier
    }

    /// Queues every URL not already visited, pending or in flight
    ///
    /// Returns the number of URLs actually queued.
    pub fn enqueue<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queued = 0;
        for url in urls {
            let url = url.into();
            if self.state_of(&url).is_some() {
                continue;
            }
            self.pending.insert(url.clone());
            self.queue.push_back(url);
            queued += 1;
        }
        queued
    }

    /// Pops the oldest pending URL and marks it in flight
    pub fn next(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&url);
        self.in_flight.insert(url.clone());
        Some(url)
    }

    /// Marks an in-flight URL visited and queues the links it produced
    ///
    /// Returns the number of newly queued URLs.
    pub fn complete<I, S>(&mut self, url: &str, discovered: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.state_of(url) {
            Some(state) if state.can_transition_to(UrlState::Visited) => {}
            Some(state) => tracing::warn!("Completing {} URL: {}", state, url),
            None => tracing::warn!("Completing unknown URL: {}", url),
        }
        self.in_flight.remove(url);
        self.visited.insert(url.to_string());
        self.enqueue(discovered)
    }

    /// Where `url` currently is, or `None` if never seen
    pub fn state_of(&self, url: &str) -> Option<UrlState> {
        if self.visited.contains(url) {
            Some(UrlState::Visited)
        } else if self.in_flight.contains(url) {
            Some(UrlState::InFlight)
        } else if self.pending.contains(url) {
            Some(UrlState::Unvisited)
        } else {
            None
        }
    }

    /// Number of visited URLs, the entry URL included
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Returns true when nothing is pending or in flight
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }
}
