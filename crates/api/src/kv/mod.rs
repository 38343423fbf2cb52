//! Expiring key-value storage.
//!
//! The cart is built on a TTL-bound mapping from opaque string keys to
//! serialized values. [`ExpiringStore`] is the seam between the cart logic
//! and the backend; [`MemoryStore`] is the in-process implementation, and a
//! Redis-backed store would implement the same trait.
//!
//! The defining operation is [`ExpiringStore::compare_and_swap`]: an atomic
//! conditional write that only succeeds if the stored value still equals the
//! expected prior value. The cart's read-modify-write cycle depends on it to
//! avoid lost updates without holding a lock.

mod memory;

pub use memory::MemoryStore;

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by an expiring store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend is unreachable or a round trip timed out.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A TTL-bound key-value store with atomic conditional writes.
///
/// Entries expire on a sliding window: every read and every write resets the
/// entry's TTL. An entry whose TTL has elapsed is observably absent to
/// `get` and `compare_and_swap` whether or not eviction has physically run.
pub trait ExpiringStore: Send + Sync {
    /// Read the value stored under `key`, refreshing its TTL.
    ///
    /// Absence is a normal outcome, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditionally store `value` under `key`, resetting its TTL.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Atomically replace the value under `key` only if it still equals
    /// `expected` (`None` means "only if absent"). Returns whether the swap
    /// was performed; `Ok(false)` means another writer got there first and
    /// nothing was mutated.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Remove the value stored under `key`. Removing an absent key is not
    /// an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
