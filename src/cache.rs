//! TTL + LRU cache for fetched sheet rows.
//!
//! The spreadsheet backend is slow and rate-limited, so repeated searches
//! within the TTL window must not re-fetch. Entries are keyed by the stable
//! string `"<spreadsheet id>/<sheet name>"` — never by a live sheet handle,
//! whose identity says nothing about the data it points at.

use anyhow::Result;
use lru::LruCache;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::Record;

struct CacheEntry {
    rows: Arc<Vec<Record>>,
    fetched_at: Instant,
}

/// A capacity-bounded cache of sheet rows with per-entry time-to-live.
///
/// Expiry is checked on read; LRU replacement evicts the coldest entry when
/// a new key is inserted at capacity. Duplicate concurrent fetches for one
/// key are tolerated — the fetch is idempotent and the lock is not held
/// across it.
pub struct SheetCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl SheetCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Builds the stable cache key for one sheet.
    pub fn key(spreadsheet_id: &str, sheet_name: &str) -> String {
        format!("{}/{}", spreadsheet_id, sheet_name)
    }

    /// Returns the cached rows for `key`, invoking `fetch` only on a miss
    /// or an expired entry.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Arc<Vec<Record>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Record>>>,
    {
        if let Some(rows) = self.get_fresh(key) {
            return Ok(rows);
        }

        // Lock released during the fetch; a concurrent miss for the same
        // key may fetch twice, which is acceptable.
        let rows = Arc::new(fetch().await?);
        let mut entries = self.entries.lock().expect("sheet cache lock poisoned");
        entries.put(
            key.to_string(),
            CacheEntry {
                rows: rows.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(rows)
    }

    fn get_fresh(&self, key: &str) -> Option<Arc<Vec<Record>>> {
        let mut entries = self.entries.lock().expect("sheet cache lock poisoned");
        if let Some(entry) = entries.get(key) {
            if entry.fetched_at.elapsed() <= self.ttl {
                return Some(entry.rows.clone());
            }
        }
        // Expired entries are dropped so LRU order reflects live ones only.
        entries.pop(key);
        None
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
