//! Request-scoped batch loading
//!
//! Implements the DataLoader pattern for preventing N+1 query problems
//! within a single GraphQL resolution pass: duplicate key lookups are
//! served from the pass-local cache and misses are fetched in one batch.
//! A [`RequestLoader`] is constructed per request and dropped with it;
//! nothing survives across requests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::Mutex;

/// Batch fetch of records by key, e.g. organizations referenced by a page
/// of affiliations.
///
/// Implementations should resolve all keys with a single database query.
/// Keys with no matching record are simply absent from the returned map.
#[async_trait]
pub trait BatchLoader<K, V>: Send + Sync
where
    K: Send + Sync + Clone + Eq + Hash,
    V: Send + Sync + Clone,
{
    async fn load_batch(&self, keys: &[K]) -> HashMap<K, V>;
}

/// Pass-local cache in front of a [`BatchLoader`].
pub struct RequestLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash,
    V: Send + Sync + Clone,
    L: BatchLoader<K, V>,
{
    loader: L,
    cache: Mutex<HashMap<K, V>>,
}

impl<K, V, L> RequestLoader<K, V, L>
where
    K: Send + Sync + Clone + Eq + Hash,
    V: Send + Sync + Clone,
    L: BatchLoader<K, V>,
{
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Load one record, hitting the cache first.
    pub async fn load(&self, key: K) -> Option<V> {
        self.load_many(vec![key.clone()]).await.remove(&key)
    }

    /// Load many records, batching every key the cache has not seen yet.
    pub async fn load_many(&self, keys: Vec<K>) -> HashMap<K, V> {
        let mut found = HashMap::new();
        let mut missing = Vec::new();

        {
            let cache = self.cache.lock().await;
            for key in keys {
                match cache.get(&key) {
                    Some(value) => {
                        found.insert(key, value.clone());
                    }
                    None => {
                        if !missing.contains(&key) {
                            missing.push(key);
                        }
                    }
                }
            }
        }

        if !missing.is_empty() {
            let fetched = self.loader.load_batch(&missing).await;
            let mut cache = self.cache.lock().await;
            for (key, value) in fetched {
                cache.insert(key.clone(), value.clone());
                found.insert(key, value);
            }
        }

        found
    }

    /// Seed the cache with a record already in hand.
    pub async fn prime(&self, key: K, value: V) {
        self.cache.lock().await.insert(key, value);
    }

    /// Drop everything cached so far in this pass.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }
}
