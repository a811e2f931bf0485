// src/cache/store.rs
// =============================================================================
// A best-effort, time-limited cache on top of a Storage backend.
//
// How it works:
// 1. set() wraps the value as {"data": ..., "writtenAt": <epoch ms>}
//    and stores it under "github_user_finder_<key>"
// 2. get() reads it back; if it is older than the TTL it is deleted and
//    reported as absent (lazy eviction, no background sweeper)
// 3. Nothing here ever returns an error: a broken cache just means
//    more network calls, so failures are logged and swallowed
//
// Rust concepts:
// - Generics with trait bounds: get<T: DeserializeOwned>, set<T: Serialize>
// - Closures returning futures: read_through(key, || async { ... })
// - Arc<dyn Fn>: An injectable clock so tests never sleep
// =============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::Storage;

// Every key we write starts with this, so clear() and stats() can tell
// our entries apart from anything else in the store
pub const CACHE_PREFIX: &str = "github_user_finder_";

// How long an entry stays valid after it was written
pub const CACHE_TTL_MINUTES: i64 = 30;

// Source of "now"; swapped for a fixed clock in tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

// On-disk shape of one entry
#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    /// Unix epoch milliseconds when the entry was written
    #[serde(rename = "writtenAt")]
    written_at: i64,
}

// Diagnostic snapshot returned by stats()
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_items: usize,
    /// Keys with the namespace prefix stripped, sorted
    pub keys: Vec<String>,
}

// Outcome of read_through(): where the value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Served from the cache, no fetch happened
    Hit(T),
    /// Fetched and written to the cache
    Miss(T),
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Lookup::Hit(value) | Lookup::Miss(value) => value,
        }
    }
}

// Cache key for a user's profile
pub fn profile_key(handle: &str) -> String {
    format!("profile:{handle}")
}

// Cache key for one page of a user's repositories (page is 1-based)
pub fn repos_key(handle: &str, page: u32) -> String {
    format!("repos:{handle}:page{page}")
}

pub struct Cache {
    storage: Box<dyn Storage>,
    ttl: Duration,
    clock: Clock,
}

impl Cache {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            ttl: Duration::minutes(CACHE_TTL_MINUTES),
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn namespaced(key: &str) -> String {
        format!("{CACHE_PREFIX}{key}")
    }

    fn now_millis(&self) -> i64 {
        (self.clock)().timestamp_millis()
    }

    // Stores `value` under `key` with the current time
    //
    // Failures (serialization, disk full, ...) are logged, never returned.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let entry = CacheEntry {
            data: value,
            written_at: self.now_millis(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };
        match self.storage.set_item(&Self::namespaced(key), &json) {
            Ok(()) => debug!(key, "cache write"),
            Err(e) => warn!(key, error = %e, "failed to write cache entry"),
        }
    }

    // Reads `key` if present and younger than the TTL
    //
    // Returns None for missing, expired or malformed entries. Expired
    // entries are deleted on the way out.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get_item(&Self::namespaced(key)) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "failed to read cache entry");
                return None;
            }
        };

        // Parse the envelope first so even an entry whose payload no
        // longer matches T can still be expired and purged
        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "malformed cache entry");
                return None;
            }
        };

        let age = self.now_millis() - entry.written_at;
        if age > self.ttl.num_milliseconds() {
            debug!(key, age_secs = age / 1000, "cache entry expired");
            self.remove(key);
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, error = %e, "cache entry has unexpected shape");
                None
            }
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(&Self::namespaced(key)) {
            warn!(key, error = %e, "failed to remove cache entry");
        }
    }

    // Removes every namespaced entry and leaves foreign keys alone
    pub fn clear(&self) {
        for key in self.own_keys() {
            if let Err(e) = self.storage.remove_item(&Self::namespaced(&key)) {
                warn!(key = %key, error = %e, "failed to remove cache entry");
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let keys = self.own_keys();
        CacheStats {
            total_items: keys.len(),
            keys,
        }
    }

    // Our keys with the prefix stripped, sorted for stable output
    fn own_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.storage.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(CACHE_PREFIX).map(str::to_string))
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to list cache keys");
                Vec::new()
            }
        };
        keys.sort();
        keys
    }

    // Returns the cached value for `key`, or runs `fetch` and caches its
    // successful result
    //
    // `fetch` is only called on a miss. Its errors are returned as-is and
    // nothing is written.
    pub async fn read_through<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<Lookup<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(Lookup::Hit(value));
        }
        let value = fetch().await?;
        self.set(key, &value);
        Ok(Lookup::Miss(value))
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    // A clock tests can move forward by hand
    use super::Clock;
    use chrono::{DateTime, Duration};
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[derive(Clone)]
    pub struct ManualClock {
        millis: Arc<AtomicI64>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                millis: Arc::new(AtomicI64::new(1_700_000_000_000)),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
        }

        pub fn clock(&self) -> Clock {
            let millis = Arc::clone(&self.millis);
            Arc::new(move || {
                DateTime::from_timestamp_millis(millis.load(Ordering::SeqCst)).unwrap_or_default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_clock::ManualClock;
    use super::*;
    use crate::cache::storage::MemoryStorage;
    use anyhow::anyhow;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with_clock() -> (Cache, ManualClock) {
        let clock = ManualClock::new();
        let cache = Cache::new(MemoryStorage::new()).with_clock(clock.clock());
        (cache, clock)
    }

    #[test]
    fn test_keys_layout() {
        assert_eq!(profile_key("octocat"), "profile:octocat");
        assert_eq!(repos_key("octocat", 3), "repos:octocat:page3");
    }

    #[test]
    fn test_set_then_get_returns_equal_value() {
        let (cache, _clock) = cache_with_clock();
        let value = json!({ "login": "octocat", "repos": [1, 2, 3] });
        cache.set("k", &value);
        assert_eq!(cache.get::<serde_json::Value>("k"), Some(value));
    }

    #[test]
    fn test_entry_valid_until_ttl_then_purged() {
        let (cache, clock) = cache_with_clock();
        cache.set("k", &42u32);

        clock.advance(Duration::minutes(CACHE_TTL_MINUTES));
        assert_eq!(cache.get::<u32>("k"), Some(42), "exactly at the TTL is still valid");

        clock.advance(Duration::milliseconds(1));
        assert_eq!(cache.get::<u32>("k"), None);
        assert!(!cache.stats().keys.contains(&"k".to_string()));
    }

    #[test]
    fn test_malformed_entry_is_absent() {
        let storage = MemoryStorage::new();
        storage
            .set_item(&format!("{CACHE_PREFIX}bad"), "not json at all")
            .unwrap();
        let cache = Cache::new(storage);
        assert_eq!(cache.get::<u32>("bad"), None);
    }

    #[test]
    fn test_wrong_shape_is_absent() {
        let (cache, _clock) = cache_with_clock();
        cache.set("k", &"a string");
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[test]
    fn test_clear_and_stats_ignore_foreign_keys() {
        let storage = MemoryStorage::new();
        storage.set_item("theme", "dark").unwrap();
        let cache = Cache::new(storage);
        cache.set("profile:octocat", &1);
        cache.set("repos:octocat:page1", &2);

        let stats = cache.stats();
        assert_eq!(stats.total_items, 2);
        assert_eq!(stats.keys, vec!["profile:octocat", "repos:octocat:page1"]);

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(
            cache.storage.get_item("theme").unwrap().as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn test_remove() {
        let (cache, _clock) = cache_with_clock();
        cache.set("k", &1);
        cache.remove("k");
        assert_eq!(cache.get::<u32>("k"), None);
    }

    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }
        fn set_item(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow!("quota exceeded"))
        }
        fn remove_item(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow!("disk on fire"))
        }
        fn keys(&self) -> anyhow::Result<Vec<String>> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[test]
    fn test_failures_are_swallowed() {
        let cache = Cache::new(BrokenStorage);
        cache.set("k", &1);
        assert_eq!(cache.get::<u32>("k"), None);
        cache.remove("k");
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_read_through_fetches_once() {
        let (cache, _clock) = cache_with_clock();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(vec![1u32, 2, 3])
        };

        let first = cache.read_through("page", fetch).await.unwrap();
        assert!(!first.is_hit());
        let second = cache.read_through("page", fetch).await.unwrap();
        assert!(second.is_hit());
        assert_eq!(second.into_inner(), vec![1, 2, 3]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_read_through_does_not_cache_errors() {
        let (cache, _clock) = cache_with_clock();
        let result: Result<Lookup<u32>, String> = cache
            .read_through("page", || async { Err("boom".to_string()) })
            .await;
        assert_eq!(result, Err("boom".to_string()));
        assert!(cache.stats().keys.is_empty());
    }
}
