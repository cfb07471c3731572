//! In-memory response cache keyed by URL.

use crate::Discovery;
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Most documents one client keeps at a time
pub(crate) const MAX_CACHE_ENTRIES: usize = 256;

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub discovery: Discovery,
    pub etag: Option<String>,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
pub(crate) struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, url: &str) -> Option<CacheEntry> {
        self.lock().get(url).cloned()
    }

    /// Store an entry, making room first
    ///
    /// Stale entries without an ETag can never be revalidated and are swept.
    /// If the cache is still full, the entry expiring soonest is evicted.
    pub fn insert(&self, url: &str, entry: CacheEntry) {
        let now = Instant::now();
        let mut entries = self.lock();
        entries.retain(|_, cached| cached.is_fresh(now) || cached.etag.is_some());

        if entries.len() >= MAX_CACHE_ENTRIES && !entries.contains_key(url) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, cached)| cached.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                entries.remove(&key);
            }
        }

        entries.insert(url.to_string(), entry);
    }

    pub fn remove(&self, url: &str) {
        self.lock().remove(url);
    }

    /// Extend a stale entry after a `304 Not Modified`
    pub fn refresh(&self, url: &str, expires_at: Instant) {
        if let Some(entry) = self.lock().get_mut(url) {
            entry.expires_at = expires_at;
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

/// Cache lifetime from `Cache-Control`; `None` means the response must not
/// be stored
pub(crate) fn cache_ttl(headers: &HeaderMap, default_ttl: Duration) -> Option<Duration> {
    let mut ttl = default_ttl;
    for value in headers.get_all(CACHE_CONTROL) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for directive in value.split(',').map(|d| d.trim().to_ascii_lowercase()) {
            if directive == "no-store" {
                return None;
            }
            if directive == "no-cache" {
                ttl = Duration::ZERO;
            } else if let Some(secs) = directive.strip_prefix("max-age=") {
                if let Ok(secs) = secs.trim_matches('"').parse::<u64>() {
                    ttl = Duration::from_secs(secs);
                }
            }
        }
    }
    Some(ttl)
}
