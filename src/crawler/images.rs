use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Process-wide set of absolute image URLs collected during a crawl
///
/// Cloning yields another handle to the same set. The set only grows while
/// the crawl runs; the asset downloader reads a snapshot afterwards.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    inner: Arc<Mutex<BTreeSet<String>>>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds URLs to the set, returning how many were new
    pub fn extend<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut set = self.lock();
        urls.into_iter().filter(|url| set.insert(url.clone())).count()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies the current contents in sorted order
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    // A panic while holding the lock cannot leave a BTreeSet half-inserted
    fn lock(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
