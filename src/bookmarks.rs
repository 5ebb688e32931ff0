//! Bookmark status cache.
//!
//! Maps a tab's URL to "is externally bookmarked", populated lazily through
//! one batched collaborator call per query. Cached answers (including
//! `false`) are never re-checked within a session. A failing or absent
//! collaborator degrades every affected URL to `false` without surfacing
//! an error; bookmark badges are decoration, not data.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;

/// Batched "is URL bookmarked" external lookup
#[async_trait]
pub trait BookmarkLookup: Send + Sync {
    async fn lookup(&self, urls: &[String]) -> Result<HashMap<String, bool>>;
}

/// Fallback when the host has no bookmark capability: everything is
/// unbookmarked, never an error. Selected once at startup.
pub struct NoopLookup;

#[async_trait]
impl BookmarkLookup for NoopLookup {
    async fn lookup(&self, urls: &[String]) -> Result<HashMap<String, bool>> {
        Ok(urls.iter().map(|u| (u.clone(), false)).collect())
    }
}

pub struct BookmarkCache {
    lookup: Arc<dyn BookmarkLookup>,
    cache: RwLock<HashMap<String, bool>>,
}

impl BookmarkCache {
    pub fn new(lookup: Arc<dyn BookmarkLookup>) -> Self {
        Self {
            lookup,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve bookmark status for a batch of URLs.
    ///
    /// Already-cached URLs are answered from cache; the remainder goes out
    /// as a single batched call. Callers bound the batch to the visible
    /// slice of the view, so fan-out stays within the display limit.
    pub async fn statuses(&self, urls: &[String]) -> HashMap<String, bool> {
        let unchecked: Vec<String> = {
            let cache = self.cache.read();
            urls.iter()
                .filter(|u| !cache.contains_key(*u))
                .cloned()
                .collect()
        };

        if !unchecked.is_empty() {
            match self.lookup.lookup(&unchecked).await {
                Ok(found) => {
                    let mut cache = self.cache.write();
                    for (url, bookmarked) in found {
                        cache.insert(url, bookmarked);
                    }
                }
                Err(e) => {
                    // Degrade silently; uncached URLs read as false below
                    debug!("bookmark lookup unavailable: {}", e);
                }
            }
        }

        let cache = self.cache.read();
        urls.iter()
            .map(|u| (u.clone(), cache.get(u).copied().unwrap_or(false)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLookup {
        calls: AtomicUsize,
        requested: parking_lot::Mutex<Vec<Vec<String>>>,
    }

    impl CountingLookup {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                requested: parking_lot::Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BookmarkLookup for CountingLookup {
        async fn lookup(&self, urls: &[String]) -> Result<HashMap<String, bool>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().push(urls.to_vec());
            Ok(urls.iter().map(|u| (u.clone(), u.contains("marked"))).collect())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl BookmarkLookup for FailingLookup {
        async fn lookup(&self, _urls: &[String]) -> Result<HashMap<String, bool>> {
            Err(Error::Other("bookmark backend unreachable".to_string()))
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batched_lookup_and_merge() {
        let lookup = Arc::new(CountingLookup::new());
        let cache = BookmarkCache::new(lookup.clone());

        let result = cache
            .statuses(&urls(&["https://marked.com", "https://plain.com"]))
            .await;

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result["https://marked.com"], true);
        assert_eq!(result["https://plain.com"], false);
    }

    #[tokio::test]
    async fn test_cached_urls_not_rechecked() {
        let lookup = Arc::new(CountingLookup::new());
        let cache = BookmarkCache::new(lookup.clone());

        cache
            .statuses(&urls(&["https://marked.com", "https://plain.com"]))
            .await;
        // Second query: one new URL, two cached (one of them false)
        cache
            .statuses(&urls(&["https://plain.com", "https://new.com"]))
            .await;

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
        let second = &lookup.requested.lock()[1];
        assert_eq!(second, &urls(&["https://new.com"]));
    }

    #[tokio::test]
    async fn test_fully_cached_batch_makes_no_call() {
        let lookup = Arc::new(CountingLookup::new());
        let cache = BookmarkCache::new(lookup.clone());

        cache.statuses(&urls(&["https://plain.com"])).await;
        cache.statuses(&urls(&["https://plain.com"])).await;

        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_degrades_to_false() {
        let cache = BookmarkCache::new(Arc::new(FailingLookup));
        let result = cache.statuses(&urls(&["https://a.com", "https://b.com"])).await;

        assert_eq!(result.len(), 2);
        assert!(result.values().all(|v| !v));
    }

    #[tokio::test]
    async fn test_noop_lookup_is_all_false() {
        let cache = BookmarkCache::new(Arc::new(NoopLookup));
        let result = cache.statuses(&urls(&["https://a.com"])).await;
        assert_eq!(result["https://a.com"], false);
    }
}
