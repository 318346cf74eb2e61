//! Redis-backed production [`Store`] implementation.

use std::future::Future;
use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tracing::warn;

use crate::{Store, StoreError, StoreResult};

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(50);

/// A [`Store`] backed by a Redis-compatible server, reached through a
/// connection-managed client that reconnects transparently.
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connects to the Redis-compatible server at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the server cannot be reached.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client =
            redis::Client::open(url).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self { manager })
    }
}

/// Retries a fallible Redis operation up to [`MAX_ATTEMPTS`] times with
/// exponential backoff, surfacing [`StoreError::Unavailable`] once the
/// budget is exhausted. Mirrors the teacher's registration retry loop.
async fn with_retry<T, F, Fut>(operation: &str, mut attempt: F) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RedisError>>,
{
    let mut delay = BASE_BACKOFF;
    let mut last_err = None;
    for attempt_no in 1..=MAX_ATTEMPTS {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(operation, attempt_no, %err, "store operation failed, retrying");
                last_err = Some(err);
                if attempt_no < MAX_ATTEMPTS {
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }
    Err(StoreError::Unavailable(format!(
        "{operation} failed after {MAX_ATTEMPTS} attempts: {}",
        last_err.expect("at least one attempt recorded")
    )))
}

#[async_trait]
impl Store for RedisStore {
    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        with_retry("hash_get", || {
            let mut conn = self.manager.clone();
            async move { conn.hget(key, field).await }
        })
        .await
    }

    async fn hash_get_all(&self, key: &str) -> StoreResult<Vec<(String, String)>> {
        with_retry("hash_get_all", || {
            let mut conn = self.manager.clone();
            async move { conn.hgetall(key).await }
        })
        .await
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        with_retry("hash_set", || {
            let mut conn = self.manager.clone();
            async move { conn.hset(key, field, value).await }
        })
        .await
    }

    async fn hash_set_if_absent(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        with_retry("hash_set_if_absent", || {
            let mut conn = self.manager.clone();
            async move { conn.hset_nx(key, field, value).await }
        })
        .await
    }

    async fn hash_delete(&self, key: &str, field: &str) -> StoreResult<()> {
        with_retry("hash_delete", || {
            let mut conn = self.manager.clone();
            async move { conn.hdel(key, field).await }
        })
        .await
    }

    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: Option<usize>,
    ) -> StoreResult<Vec<String>> {
        with_retry("list_append_bounded", || {
            let mut conn = self.manager.clone();
            async move {
                conn.rpush::<_, _, ()>(key, value).await?;
                let Some(max_len) = max_len else {
                    return Ok(Vec::new());
                };
                let len: usize = conn.llen(key).await?;
                if len <= max_len {
                    return Ok(Vec::new());
                }
                let excess = NonZeroUsize::new(len - max_len).expect("len > max_len");
                conn.lpop(key, Some(excess)).await
            }
        })
        .await
    }

    async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<()> {
        with_retry("list_push_front", || {
            let mut conn = self.manager.clone();
            async move { conn.lpush(key, value).await }
        })
        .await
    }

    async fn list_tail(&self, key: &str, limit: Option<usize>) -> StoreResult<Vec<String>> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let mut values: Vec<String> = with_retry("list_tail", || {
            let mut conn = self.manager.clone();
            async move {
                match limit {
                    Some(limit) => conn.lrange(key, -(limit as isize), -1).await,
                    None => conn.lrange(key, 0, -1).await,
                }
            }
        })
        .await?;
        values.reverse();
        Ok(values)
    }

    async fn list_drain(&self, key: &str) -> StoreResult<Vec<String>> {
        with_retry("list_drain", || {
            let mut conn = self.manager.clone();
            async move {
                let (values,): (Vec<String>,) = redis::pipe()
                    .atomic()
                    .lrange(key, 0, -1)
                    .del(key)
                    .ignore()
                    .query_async(&mut conn)
                    .await?;
                Ok(values)
            }
        })
        .await
    }

    async fn list_len(&self, key: &str) -> StoreResult<usize> {
        with_retry("list_len", || {
            let mut conn = self.manager.clone();
            async move { conn.llen(key).await }
        })
        .await
    }

    async fn string_set_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        with_retry("string_set_ttl", || {
            let mut conn = self.manager.clone();
            async move { conn.set_ex::<_, _, ()>(key, value, ttl_secs).await }
        })
        .await
    }

    async fn string_set(&self, key: &str, value: &str) -> StoreResult<()> {
        with_retry("string_set", || {
            let mut conn = self.manager.clone();
            async move { conn.set::<_, _, ()>(key, value).await }
        })
        .await
    }

    async fn string_get(&self, key: &str) -> StoreResult<Option<String>> {
        with_retry("string_get", || {
            let mut conn = self.manager.clone();
            async move { conn.get(key).await }
        })
        .await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        with_retry("exists", || {
            let mut conn = self.manager.clone();
            async move { conn.exists(key).await }
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        with_retry("delete", || {
            let mut conn = self.manager.clone();
            async move { conn.del(key).await }
        })
        .await
    }

    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        with_retry("scan_prefix", || {
            let mut conn = self.manager.clone();
            let pattern = format!("{prefix}*");
            async move {
                use futures::StreamExt;
                let mut iter = conn.scan_match::<_, String>(&pattern).await?;
                let mut keys = Vec::new();
                while let Some(key) = iter.next().await {
                    keys.push(key);
                }
                Ok(keys)
            }
        })
        .await
    }
}
