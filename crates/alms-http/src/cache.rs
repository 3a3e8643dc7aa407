//! Short-TTL response cache for successful reads.
//!
//! Entries are keyed by path plus sorted query parameters. A stale entry is
//! reported absent but left in place; capacity overflow evicts the oldest
//! inserted key (FIFO, reads do not refresh position).

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Freshness window and size bound.
///
/// Writes never invalidate cached reads, so `ttl` is also the longest a
/// read can lag behind a mutation made elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub capacity: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            capacity: 50,
        }
    }
}

impl From<&alms_config::CacheConfig> for CachePolicy {
    fn from(config: &alms_config::CacheConfig) -> Self {
        Self {
            ttl: Duration::from_secs(config.ttl_secs),
            capacity: config.capacity.max(1),
        }
    }
}

struct Entry {
    payload: Value,
    stored_at: Instant,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, Entry>,
    order: VecDeque<String>,
}

pub struct ResponseCache {
    policy: CachePolicy,
    entries: Mutex<Entries>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl ResponseCache {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(Entries::default()),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// The cached payload for `key`, if it is younger than the TTL.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.lock();
        entries
            .map
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.policy.ttl)
            .map(|entry| entry.payload.clone())
    }

    /// Store `payload` under `key`, evicting the oldest key when full.
    pub fn set(&self, key: &str, payload: Value) {
        let mut entries = self.lock();
        let stored_at = Instant::now();

        if let Some(entry) = entries.map.get_mut(key) {
            entry.payload = payload;
            entry.stored_at = stored_at;
            return;
        }

        if entries.map.len() >= self.policy.capacity
            && let Some(oldest) = entries.order.pop_front()
        {
            entries.map.remove(&oldest);
            tracing::trace!(key = %oldest, "evicted oldest cache entry");
        }

        entries.order.push_back(key.to_string());
        entries.map.insert(key.to_string(), Entry { payload, stored_at });
    }

    /// Number of stored entries, stale ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.map.clear();
        entries.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Deterministic cache key: `path` plus the query string with parameters
/// in sorted order.
#[must_use]
pub fn cache_key(path: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}
