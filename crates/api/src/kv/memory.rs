//! In-process expiring store backed by `moka`.
//!
//! Each entry carries its own TTL and the [`Expiry`] policy returns it on
//! create, read, and update, which gives the sliding-expiration behavior the
//! cart needs. Compare-and-swap rides on moka's entry API, whose compute
//! closure runs exclusively per key.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::{CompResult, Op};

use super::{ExpiringStore, StoreError};

/// Default bound on the number of live entries.
const DEFAULT_MAX_ENTRIES: u64 = 100_000;

/// A stored value together with the TTL it was written with.
#[derive(Debug, Clone)]
struct StoredValue {
    payload: String,
    ttl: Duration,
}

/// Expiry policy that reads the TTL off the stored value and restarts the
/// window on every access.
struct SlidingExpiry;

impl Expiry<String, StoredValue> for SlidingExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_read(
        &self,
        _key: &String,
        value: &StoredValue,
        _read_at: Instant,
        _duration_until_expiry: Option<Duration>,
        _last_modified_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory [`ExpiringStore`].
///
/// Cheaply cloneable; clones share the same underlying cache.
#[derive(Clone)]
pub struct MemoryStore {
    cache: Cache<String, StoredValue>,
}

impl MemoryStore {
    /// Create a store bounded to `max_entries` live entries.
    #[must_use]
    pub fn with_capacity(max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(SlidingExpiry)
            .build();

        Self { cache }
    }

    /// Create a store with the default capacity bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl ExpiringStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.get(key).await.map(|stored| stored.payload))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let stored = StoredValue {
            payload: value.to_owned(),
            ttl,
        };
        self.cache.insert(key.to_owned(), stored).await;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let next = StoredValue {
            payload: value.to_owned(),
            ttl,
        };

        let result = self
            .cache
            .entry(key.to_owned())
            .and_compute_with(|current| {
                // Expired entries are presented as absent, so lazy expiry
                // and active eviction are indistinguishable here.
                let matches = match (current.as_ref(), expected) {
                    (None, None) => true,
                    (Some(entry), Some(want)) => entry.value().payload == want,
                    _ => false,
                };

                let op = if matches { Op::Put(next) } else { Op::Nop };
                std::future::ready(op)
            })
            .await;

        Ok(matches!(
            result,
            CompResult::Inserted(_) | CompResult::ReplacedWith(_)
        ))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_get_absent_key() {
        let store = MemoryStore::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryStore::new();
        store.put("k", "v1", TTL).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        // put is an unconditional overwrite
        store.put("k", "v2", TTL).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_cas_insert_when_absent() {
        let store = MemoryStore::new();
        assert!(store.compare_and_swap("k", None, "v1", TTL).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        // A second absent-expectation swap must fail: the key now exists.
        assert!(!store.compare_and_swap("k", None, "v2", TTL).await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_cas_swaps_only_on_match() {
        let store = MemoryStore::new();
        store.put("k", "v1", TTL).await.unwrap();

        assert!(
            !store
                .compare_and_swap("k", Some("stale"), "v2", TTL)
                .await
                .unwrap()
        );
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        assert!(
            store
                .compare_and_swap("k", Some("v1"), "v2", TTL)
                .await
                .unwrap()
        );
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.put("k", "v1", TTL).await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        // Deleting again is not an error.
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store.put("k", "v1", Duration::from_millis(50)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get("k").await.unwrap(), None);

        // An expired entry reads as absent for CAS purposes too.
        assert!(store.compare_and_swap("k", None, "v2", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn test_read_slides_expiry_window() {
        let store = MemoryStore::new();
        store
            .put("k", "v1", Duration::from_millis(200))
            .await
            .unwrap();

        // Read before expiry; the window restarts from the read.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        // Past the original deadline but within the refreshed one.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        // With no further access the entry finally lapses.
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
