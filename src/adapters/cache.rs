use crate::adapters::storage::LocalStorage;
use crate::domain::ports::Storage;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
struct CachedResponse {
    url: String,
    fetched_at: DateTime<Utc>,
    body: Value,
}

/// On-disk cache of provider responses, keyed by query.
///
/// Participation is decided by whoever constructs the provider; there is no global switch.
/// Cache problems never fail a query: unreadable entries are misses, failed writes are logged.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    storage: LocalStorage,
    max_age: Duration,
}

impl ResponseCache {
    pub fn new(storage: LocalStorage, max_age: Duration) -> Self {
        Self { storage, max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Cached body for `key`, if it was fetched from `url` within `max_age`.
    pub async fn get(&self, key: &str, url: &str) -> Option<Value> {
        self.get_at(key, url, Utc::now()).await
    }

    async fn get_at(&self, key: &str, url: &str, now: DateTime<Utc>) -> Option<Value> {
        let bytes = match self.storage.read_file(key).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Could not read cache entry {}: {}", key, e);
                return None;
            }
        };

        let cached: CachedResponse = match serde_json::from_slice(&bytes) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry {}: {}", key, e);
                self.evict(key).await;
                return None;
            }
        };

        if cached.url != url {
            tracing::debug!("Cache entry {} was fetched from a different URL", key);
            self.evict(key).await;
            return None;
        }
        if now - cached.fetched_at > self.max_age {
            tracing::debug!("Cache entry {} expired (fetched {})", key, cached.fetched_at);
            self.evict(key).await;
            return None;
        }

        tracing::debug!("Cache hit for {}", key);
        Some(cached.body)
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.storage.remove_file(key).await {
            tracing::warn!("Could not remove stale cache entry {}: {}", key, e);
        }
    }

    pub async fn put(&self, key: &str, url: &str, body: &Value) {
        self.put_at(key, url, body, Utc::now()).await
    }

    async fn put_at(&self, key: &str, url: &str, body: &Value, now: DateTime<Utc>) {
        let entry = CachedResponse {
            url: url.to_string(),
            fetched_at: now,
            body: body.clone(),
        };

        let bytes = match serde_json::to_vec(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Could not serialize cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.storage.write_file(key, &bytes).await {
            tracing::warn!("Could not write cache entry {}: {}", key, e);
        }
    }
}
