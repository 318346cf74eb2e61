//! In-process store double backed by a single lock-guarded map.
//!
//! Exists for the coordination-handler test suite so tests do not require a
//! live Redis instance; every operation is serialized through one
//! [`tokio::sync::RwLock`], which trivially satisfies the per-call atomicity
//! contract of [`Store`].

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Store, StoreResult};

#[derive(Default)]
struct Inner {
    hashes: HashMap<String, HashMap<String, String>>,
    lists: HashMap<String, VecDeque<String>>,
    strings: HashMap<String, (String, Option<Instant>)>,
}

impl Inner {
    fn string_is_live(&self, key: &str) -> bool {
        match self.strings.get(key) {
            Some((_, Some(expires))) => *expires > Instant::now(),
            Some((_, None)) => true,
            None => false,
        }
    }
}

/// An in-memory [`Store`] implementation, suitable for unit and integration tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let guard = self.inner.read().await;
        Ok(guard
            .hashes
            .get(key)
            .and_then(|h| h.get(field))
            .cloned())
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<Vec<(String, String)>> {
        let guard = self.inner.read().await;
        Ok(guard
            .hashes
            .get(key)
            .map(|h| h.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        guard
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_set_if_absent(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        let mut guard = self.inner.write().await;
        let hash = guard.hashes.entry(key.to_string()).or_default();
        if hash.contains_key(field) {
            Ok(false)
        } else {
            hash.insert(field.to_string(), value.to_string());
            Ok(true)
        }
    }

    async fn hash_delete(&self, key: &str, field: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        if let Some(hash) = guard.hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }

    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: Option<usize>,
    ) -> StoreResult<Vec<String>> {
        let mut guard = self.inner.write().await;
        let list = guard.lists.entry(key.to_string()).or_default();
        list.push_back(value.to_string());

        let mut evicted = Vec::new();
        if let Some(max_len) = max_len {
            while list.len() > max_len {
                if let Some(front) = list.pop_front() {
                    evicted.push(front);
                }
            }
        }
        Ok(evicted)
    }

    async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        guard
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn list_tail(&self, key: &str, limit: Option<usize>) -> StoreResult<Vec<String>> {
        let guard = self.inner.read().await;
        let Some(list) = guard.lists.get(key) else {
            return Ok(Vec::new());
        };
        let take = limit.unwrap_or(list.len()).min(list.len());
        Ok(list.iter().rev().take(take).cloned().collect())
    }

    async fn list_drain(&self, key: &str) -> StoreResult<Vec<String>> {
        let mut guard = self.inner.write().await;
        Ok(guard
            .lists
            .remove(key)
            .map(|list| list.into_iter().collect())
            .unwrap_or_default())
    }

    async fn list_len(&self, key: &str) -> StoreResult<usize> {
        let guard = self.inner.read().await;
        Ok(guard.lists.get(key).map_or(0, VecDeque::len))
    }

    async fn string_set_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        let expires = Instant::now() + Duration::from_secs(ttl_secs);
        guard
            .strings
            .insert(key.to_string(), (value.to_string(), Some(expires)));
        Ok(())
    }

    async fn string_set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        guard.strings.insert(key.to_string(), (value.to_string(), None));
        Ok(())
    }

    async fn string_get(&self, key: &str) -> StoreResult<Option<String>> {
        let guard = self.inner.read().await;
        if guard.string_is_live(key) {
            Ok(guard.strings.get(key).map(|(v, _)| v.clone()))
        } else {
            Ok(None)
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        let guard = self.inner.read().await;
        Ok(guard.hashes.contains_key(key)
            || guard.lists.contains_key(key)
            || guard.string_is_live(key))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut guard = self.inner.write().await;
        guard.hashes.remove(key);
        guard.lists.remove(key);
        guard.strings.remove(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let guard = self.inner.read().await;
        let mut keys: Vec<String> = guard
            .hashes
            .keys()
            .chain(guard.lists.keys())
            .chain(guard.strings.keys().filter(|k| guard.string_is_live(k)))
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
