use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

/// Time source for cache expiry; swapped for a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Clone)]
struct Entry {
    payload: serde_json::Value,
    expires_at: OffsetDateTime,
}

/// Process-local TTL cache for feed payloads. Entries are immutable once
/// written and replaced wholesale; a read after expiry is a miss. Keys are
/// `user:{id}:{feed}` for personalized feeds and a bare feed name otherwise.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut cache = self.inner.lock().await;
        match cache.get(key) {
            Some(entry) if self.clock.now() < entry.expires_at => {
                debug!(key, "cache hit");
                Some(entry.payload.clone())
            }
            Some(_) => {
                debug!(key, "cache expired");
                cache.remove(key);
                None
            }
            None => {
                debug!(key, "cache miss");
                None
            }
        }
    }

    pub async fn put(&self, key: impl Into<String>, payload: serde_json::Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.inner.lock().await.insert(
            key.into(),
            Entry {
                payload,
                expires_at,
            },
        );
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.lock().await.remove(key);
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut cache = self.inner.lock().await;
        cache.retain(|key, _| !key.starts_with(prefix));
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct ManualClock(std::sync::Mutex<OffsetDateTime>);

    impl ManualClock {
        fn starting_now() -> Arc<Self> {
            Arc::new(Self(std::sync::Mutex::new(OffsetDateTime::now_utc())))
        }

        fn advance(&self, d: Duration) {
            *self.0.lock().unwrap() += d;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_returned() {
        let cache = ResponseCache::new();
        cache
            .put("meme", json!({"title": "hodl"}), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("meme").await, Some(json!({"title": "hodl"})));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let clock = ManualClock::starting_now();
        let cache = ResponseCache::with_clock(clock.clone());

        cache.put("meme", json!(1), Duration::from_secs(60)).await;
        assert!(cache.get("meme").await.is_some());

        clock.advance(Duration::from_secs(61));
        assert!(cache.get("meme").await.is_none());
    }

    #[tokio::test]
    async fn entry_at_exact_expiry_is_a_miss() {
        let clock = ManualClock::starting_now();
        let cache = ResponseCache::with_clock(clock.clone());

        cache.put("prices", json!(1), Duration::from_secs(30)).await;
        clock.advance(Duration::from_secs(30));
        assert!(cache.get("prices").await.is_none());
    }

    #[tokio::test]
    async fn invalidate_prefix_drops_only_matching_keys() {
        let cache = ResponseCache::new();
        let ttl = Duration::from_secs(60);
        cache.put("user:1:prices", json!(1), ttl).await;
        cache.put("user:1:news", json!(2), ttl).await;
        cache.put("user:2:prices", json!(3), ttl).await;
        cache.put("meme", json!(4), ttl).await;

        cache.invalidate_prefix("user:1:").await;

        assert!(cache.get("user:1:prices").await.is_none());
        assert!(cache.get("user:1:news").await.is_none());
        assert!(cache.get("user:2:prices").await.is_some());
        assert!(cache.get("meme").await.is_some());
    }

    #[tokio::test]
    async fn put_replaces_existing_entry() {
        let cache = ResponseCache::new();
        cache.put("meme", json!(1), Duration::from_secs(60)).await;
        cache.put("meme", json!(2), Duration::from_secs(60)).await;
        assert_eq!(cache.get("meme").await, Some(json!(2)));
    }
}
