//! Size- and time-bounded in-memory store of URL → item-list entries.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use url::Url;

use crate::config::CacheConfig;
use crate::item::Item;

/// Aggregate cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_size_bytes: usize,
}

struct CacheEntry {
    items: Vec<Item>,
    captured_at: Instant,
    /// Approximate size precomputed at write time.
    size: usize,
    /// Expiration snapshot taken from the config at write time.
    expires_after: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.captured_at.elapsed() > self.expires_after
    }
}

struct CacheInner {
    entries: HashMap<Url, CacheEntry>,
    /// Running total; always equals the sum of all live entries' sizes and
    /// is adjusted in lock-step with every insert/remove/evict.
    total_size: usize,
}

/// In-memory feed cache.
///
/// All access to the entry map and the size counter goes through one mutex,
/// so every read observes a fully-formed prior write. Reads are not purely
/// read-only: a read that finds an expired entry removes it (lazy eviction).
///
/// Eviction under size pressure removes the globally least-recently-
/// *captured* entry: write time, not read time. A just-read old entry is
/// still evicted before a recently-written one.
pub struct FeedCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl FeedCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                total_size: 0,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached item list for `url`, or `None` when absent or
    /// expired. An expired entry is removed on the way out.
    pub async fn get(&self, url: &Url) -> Option<Vec<Item>> {
        let mut inner = self.inner.lock().await;

        let expired = inner.entries.get(url)?.is_expired();
        if expired {
            if let Some(entry) = inner.entries.remove(url) {
                inner.total_size -= entry.size;
                tracing::debug!(url = %url, size = entry.size, "expired cache entry removed on read");
            }
            return None;
        }

        inner.entries.get(url).map(|entry| entry.items.clone())
    }

    /// Stores `items` under `url`, replacing any previous entry wholesale.
    ///
    /// A write whose approximate size exceeds the configured maximum is
    /// rejected entirely (logged, not returned as an error), leaving any
    /// prior entry for that key untouched. Otherwise the least-recently-
    /// captured entries are evicted until the new entry fits.
    pub async fn set(&self, url: Url, items: Vec<Item>) {
        let size = estimate_size(&items);
        if size > self.config.max_size_bytes {
            tracing::warn!(
                url = %url,
                size = size,
                max = self.config.max_size_bytes,
                "cache entry exceeds maximum cache size, not cached"
            );
            return;
        }

        let mut inner = self.inner.lock().await;

        while inner.total_size + size > self.config.max_size_bytes {
            if !evict_oldest(&mut inner) {
                break;
            }
        }

        let entry = CacheEntry {
            items,
            captured_at: Instant::now(),
            size,
            expires_after: self.config.expiration(),
        };
        if let Some(old) = inner.entries.insert(url.clone(), entry) {
            inner.total_size -= old.size;
        }
        inner.total_size += size;

        tracing::debug!(url = %url, size = size, total = inner.total_size, "cache entry set");
    }

    /// Deletes the entry for `url` if present; no-op otherwise.
    pub async fn remove(&self, url: &Url) {
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.entries.remove(url) {
            inner.total_size -= entry.size;
            tracing::debug!(url = %url, "cache entry removed");
        }
    }

    /// Drops all entries and resets the size counter.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.total_size = 0;
        tracing::debug!("cache cleared");
    }

    /// Current entry count and total approximate size.
    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            entries: inner.entries.len(),
            total_size_bytes: inner.total_size,
        }
    }
}

fn evict_oldest(inner: &mut CacheInner) -> bool {
    let oldest = inner
        .entries
        .iter()
        .min_by_key(|(_, entry)| entry.captured_at)
        .map(|(url, _)| url.clone());

    match oldest {
        Some(url) => {
            if let Some(entry) = inner.entries.remove(&url) {
                inner.total_size -= entry.size;
                tracing::debug!(url = %url, size = entry.size, "evicted least-recently-captured entry");
            }
            true
        }
        None => false,
    }
}

/// Approximate entry size: the sum of UTF-8 byte lengths of every textual
/// field across all items. Deliberately not an exact memory footprint;
/// changing this changes eviction timing.
fn estimate_size(items: &[Item]) -> usize {
    items
        .iter()
        .map(|item| {
            item.title.len()
                + item.description.len()
                + item.content.as_deref().map_or(0, str::len)
                + item.link.as_str().len()
                + item.author.as_deref().map_or(0, str::len)
                + item.categories.iter().map(String::len).sum::<usize>()
        })
        .sum()
}
