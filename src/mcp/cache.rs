//! Bounded cache of MCP client instances.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::client::McpClient;
use super::retry::RetryPolicy;

type CacheKey = (String, Option<String>);

/// Cache of client instances keyed by (endpoint, credential).
///
/// Repeated calls to the same server reuse one client and its connection
/// pool. Entries never expire by time; the cache is bounded by count with
/// FIFO eviction. Owned by the process context and passed to components
/// at construction; there is no process-wide client state.
pub struct ClientCache {
    capacity: usize,
    retry: RetryPolicy,
    request_timeout: Duration,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    clients: HashMap<CacheKey, Arc<McpClient>>,
    order: VecDeque<CacheKey>,
}

impl ClientCache {
    /// Create a cache holding at most `capacity` clients.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(capacity, RetryPolicy::default(), Duration::from_secs(30))
    }

    /// Create a cache whose clients use the given retry policy and
    /// per-attempt timeout.
    pub fn with_config(capacity: usize, retry: RetryPolicy, request_timeout: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            retry,
            request_timeout,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Get the client for an endpoint/credential pair, creating it on
    /// first use.
    pub fn get_or_create(&self, base_url: &str, auth_token: Option<&str>) -> Arc<McpClient> {
        let key: CacheKey = (base_url.to_string(), auth_token.map(String::from));
        let mut inner = self.inner.lock().unwrap();

        if let Some(client) = inner.clients.get(&key) {
            return client.clone();
        }

        if inner.clients.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.clients.remove(&oldest);
                tracing::debug!("Evicted cached MCP client for {}", oldest.0);
            }
        }

        let client = Arc::new(
            McpClient::with_policy(base_url, auth_token.map(String::from), self.retry.clone())
                .with_timeout(self.request_timeout),
        );
        inner.clients.insert(key.clone(), client.clone());
        inner.order.push_back(key);
        client
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_pair_reuses_instance() {
        let cache = ClientCache::new(4);

        let a = cache.get_or_create("http://server-a", Some("token"));
        let b = cache.get_or_create("http://server-a", Some("token"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_credential_distinguishes_entries() {
        let cache = ClientCache::new(4);

        let with_token = cache.get_or_create("http://server-a", Some("token"));
        let without = cache.get_or_create("http://server-a", None);
        assert!(!Arc::ptr_eq(&with_token, &without));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let cache = ClientCache::new(2);

        let first = cache.get_or_create("http://server-1", None);
        cache.get_or_create("http://server-2", None);
        cache.get_or_create("http://server-3", None);
        assert_eq!(cache.len(), 2);

        // server-1 was evicted; a fresh instance is built for it.
        let rebuilt = cache.get_or_create("http://server-1", None);
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let cache = ClientCache::new(0);
        cache.get_or_create("http://server-1", None);
        assert_eq!(cache.len(), 1);
    }
}
