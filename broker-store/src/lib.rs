//! Abstract key-value / data-structure store backing the coordination broker.
//!
//! The coordination handlers in `broker-kernel` depend on the [`Store`] trait
//! rather than a concrete backend. [`memory::MemoryStore`] is an in-process
//! double for tests; [`redis_store::RedisStore`] is the production backend.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod memory;
pub mod redis_store;

pub use error::{StoreError, StoreResult};

use async_trait::async_trait;
use broker_primitives::ProjectId;

/// Namespaced key construction: `project:{project_id}:{resource}[:{id}]`.
#[must_use]
pub fn project_key(project_id: &ProjectId, resource: &str) -> String {
    format!("project:{project_id}:{resource}")
}

/// Namespaced key construction with a trailing entity id.
#[must_use]
pub fn project_key_id(project_id: &ProjectId, resource: &str, id: &str) -> String {
    format!("project:{project_id}:{resource}:{id}")
}

/// A small vocabulary of atomic operations over hashes, lists, and strings,
/// scoped by caller-constructed namespaced keys.
///
/// Implementations must guarantee that each individual method call is atomic
/// from the perspective of concurrent callers; the coordination handlers
/// build their own multi-step semantics (compare-and-set, bounded eviction)
/// out of these primitives.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads a single hash field.
    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// Reads every field/value pair of a hash.
    async fn hash_get_all(&self, key: &str) -> StoreResult<Vec<(String, String)>>;

    /// Unconditionally sets a hash field.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// Sets a hash field only if it was previously absent.
    ///
    /// Returns `true` if this call created the field, `false` if it already
    /// existed (and was left untouched). Used for lock acquisition: exactly
    /// one of a set of concurrent callers observes `true`.
    async fn hash_set_if_absent(&self, key: &str, field: &str, value: &str) -> StoreResult<bool>;

    /// Deletes a hash field. A no-op if it did not exist.
    async fn hash_delete(&self, key: &str, field: &str) -> StoreResult<()>;

    /// Appends a value to the tail of a list, optionally trimming from the
    /// front if the list now exceeds `max_len`.
    ///
    /// Returns the elements evicted from the front, oldest first (empty if
    /// no eviction occurred).
    async fn list_append_bounded(
        &self,
        key: &str,
        value: &str,
        max_len: Option<usize>,
    ) -> StoreResult<Vec<String>>;

    /// Pushes a value onto the front of a list.
    async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Returns up to `limit` elements from the tail of a list (most recently
    /// appended first), or every element if `limit` is `None`.
    async fn list_tail(&self, key: &str, limit: Option<usize>) -> StoreResult<Vec<String>>;

    /// Atomically reads and clears a list, returning its prior contents in
    /// insertion order.
    async fn list_drain(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Returns the number of elements in a list.
    async fn list_len(&self, key: &str) -> StoreResult<usize>;

    /// Sets a string value with a time-to-live.
    async fn string_set_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    /// Sets a string value with no expiry, for records that must outlive any
    /// single agent's lifetime (e.g. completion records).
    async fn string_set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Reads a string value, returning `None` if absent or expired.
    async fn string_get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Reports whether a key (of any type) currently exists.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Deletes a key of any type.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Lists every key matching a literal prefix.
    async fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}
