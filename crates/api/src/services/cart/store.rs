//! Atomic cart mutations on top of the expiring store.
//!
//! Carts are mutated by many concurrent request handlers for the same user
//! (double-clicks, parallel tabs, retried requests). No handler may assume
//! exclusive access, and the store offers no transactions, so every mutation
//! runs a read–modify–compare-and-swap cycle: read the current serialized
//! cart, apply the change, and install the result only if the stored value
//! is still exactly what was read. A lost swap means another writer got in
//! between; the cycle re-reads and recomputes against the winner's value.
//!
//! The loop is bounded: after [`MAX_SWAP_ATTEMPTS`] lost races the operation
//! fails with [`CartError::Contention`] rather than spinning. Each store
//! round trip is also bounded by a per-call timeout so a stuck backend
//! surfaces as [`StoreError::Unavailable`] instead of hanging the request.
//! If the caller is cancelled mid-cycle the future is simply dropped and no
//! further attempt is issued.

use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use bramble_core::BookId;

use super::error::CartError;
use crate::kv::{ExpiringStore, StoreError};
use crate::models::Cart;

/// Upper bound on compare-and-swap retries per mutation.
pub const MAX_SWAP_ATTEMPTS: u32 = 5;

/// Usernames longer than this are rejected up front.
const MAX_USERNAME_LEN: usize = 64;

/// Cart storage keyed by username.
///
/// Exclusively owns the cart records' lifecycle; nothing else writes to the
/// `cart:` keyspace.
pub struct CartStore<S> {
    backend: S,
    ttl: Duration,
    op_timeout: Duration,
}

impl<S: ExpiringStore> CartStore<S> {
    /// Create a cart store over `backend`.
    ///
    /// `ttl` is the sliding expiration window applied on every read and
    /// write; `op_timeout` bounds each individual store round trip.
    pub const fn new(backend: S, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            backend,
            ttl,
            op_timeout,
        }
    }

    /// Add `book` to the user's cart, creating the cart if absent.
    ///
    /// Adding a book that is already present returns the unchanged cart
    /// without attempting a swap.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Contention`] when the bounded retry budget is
    /// exhausted, [`CartError::Store`] when the backend is unavailable.
    pub async fn add(&self, username: &str, book: BookId) -> Result<Cart, CartError> {
        validate_username(username)?;
        validate_book(book)?;
        let key = cart_key(username);

        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let current = self.read_raw(&key).await?;
            let mut cart = decode(current.as_deref())?;

            if !cart.insert(book) {
                // Already present; the read refreshed the TTL and there is
                // nothing to write, so skip the swap entirely.
                return Ok(cart);
            }

            let next = encode(&cart)?;
            if self.swap(&key, current.as_deref(), &next).await? {
                return Ok(cart);
            }

            debug!(username, book = %book, attempt, "cart add lost swap race, retrying");
        }

        Err(CartError::Contention {
            attempts: MAX_SWAP_ATTEMPTS,
        })
    }

    /// Remove `book` from the user's cart, preserving the order of the rest.
    ///
    /// Removing a book that is not in the cart returns the unchanged cart
    /// without attempting a swap.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CartStore::add`].
    pub async fn remove(&self, username: &str, book: BookId) -> Result<Cart, CartError> {
        validate_username(username)?;
        validate_book(book)?;
        let key = cart_key(username);

        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            let current = self.read_raw(&key).await?;
            let mut cart = decode(current.as_deref())?;

            if !cart.remove(book) {
                return Ok(cart);
            }

            let next = encode(&cart)?;
            if self.swap(&key, current.as_deref(), &next).await? {
                return Ok(cart);
            }

            debug!(username, book = %book, attempt, "cart remove lost swap race, retrying");
        }

        Err(CartError::Contention {
            attempts: MAX_SWAP_ATTEMPTS,
        })
    }

    /// Read the user's cart. An absent record reads as an empty cart, and
    /// the read itself refreshes the sliding expiration window.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Store`] when the backend is unavailable; callers
    /// that prefer degraded availability over an outage may map that to an
    /// empty cart themselves.
    pub async fn get(&self, username: &str) -> Result<Cart, CartError> {
        validate_username(username)?;
        let raw = self.read_raw(&cart_key(username)).await?;
        decode(raw.as_deref())
    }

    /// Drop the user's cart. Idempotent; clearing an absent cart succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Store`] when the backend is unavailable.
    pub async fn clear(&self, username: &str) -> Result<(), CartError> {
        validate_username(username)?;
        let key = cart_key(username);
        self.bounded(self.backend.delete(&key)).await?;
        Ok(())
    }

    async fn read_raw(&self, key: &str) -> Result<Option<String>, CartError> {
        self.bounded(self.backend.get(key)).await
    }

    async fn swap(
        &self,
        key: &str,
        expected: Option<&str>,
        next: &str,
    ) -> Result<bool, CartError> {
        self.bounded(self.backend.compare_and_swap(key, expected, next, self.ttl))
            .await
    }

    /// Run a store round trip under the per-call timeout.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, CartError> {
        match timeout(self.op_timeout, op).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CartError::Store(StoreError::Unavailable(format!(
                "round trip exceeded {:?}",
                self.op_timeout
            )))),
        }
    }
}

/// Derive the store key for a user's cart.
fn cart_key(username: &str) -> String {
    format!("cart:{username}")
}

fn validate_username(username: &str) -> Result<(), CartError> {
    if username.is_empty() {
        return Err(CartError::Validation("username must not be empty".into()));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(CartError::Validation(format!(
            "username longer than {MAX_USERNAME_LEN} bytes"
        )));
    }
    if username.chars().any(char::is_control) {
        return Err(CartError::Validation(
            "username must not contain control characters".into(),
        ));
    }
    Ok(())
}

fn validate_book(book: BookId) -> Result<(), CartError> {
    if book.as_i32() <= 0 {
        return Err(CartError::Validation(format!(
            "book id must be positive, got {book}"
        )));
    }
    Ok(())
}

fn decode(raw: Option<&str>) -> Result<Cart, CartError> {
    match raw {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(Cart::new()),
    }
}

fn encode(cart: &Cart) -> Result<String, CartError> {
    Ok(serde_json::to_string(cart)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::kv::MemoryStore;

    const TTL: Duration = Duration::from_secs(60);
    const OP_TIMEOUT: Duration = Duration::from_millis(250);

    fn store() -> CartStore<MemoryStore> {
        CartStore::new(MemoryStore::new(), TTL, OP_TIMEOUT)
    }

    fn book(id: i32) -> BookId {
        BookId::new(id)
    }

    #[tokio::test]
    async fn test_get_absent_cart_is_empty() {
        let carts = store();
        let cart = carts.get("alice").await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let carts = store();
        let cart = carts.add("alice", book(7)).await.unwrap();
        assert_eq!(cart.items(), &[book(7)]);

        let cart = carts.get("alice").await.unwrap();
        assert_eq!(cart.items(), &[book(7)]);
    }

    #[tokio::test]
    async fn test_add_twice_is_idempotent() {
        let carts = store();
        carts.add("alice", book(7)).await.unwrap();
        carts.add("alice", book(9)).await.unwrap();
        let cart = carts.add("alice", book(7)).await.unwrap();
        assert_eq!(cart.items(), &[book(7), book(9)]);
    }

    #[tokio::test]
    async fn test_remove_preserves_order() {
        let carts = store();
        carts.add("alice", book(1)).await.unwrap();
        carts.add("alice", book(2)).await.unwrap();
        carts.add("alice", book(3)).await.unwrap();

        let cart = carts.remove("alice", book(2)).await.unwrap();
        assert_eq!(cart.items(), &[book(1), book(3)]);
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let carts = store();
        carts.add("alice", book(1)).await.unwrap();
        let cart = carts.remove("alice", book(42)).await.unwrap();
        assert_eq!(cart.items(), &[book(1)]);

        // Removing from a never-created cart is also fine.
        let cart = carts.remove("bob", book(42)).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let carts = store();
        carts.add("alice", book(7)).await.unwrap();
        carts.clear("alice").await.unwrap();
        assert!(carts.get("alice").await.unwrap().is_empty());
        carts.clear("alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_carts_are_independent_per_user() {
        let carts = store();
        carts.add("alice", book(7)).await.unwrap();
        carts.add("bob", book(9)).await.unwrap();

        assert_eq!(carts.get("alice").await.unwrap().items(), &[book(7)]);
        assert_eq!(carts.get("bob").await.unwrap().items(), &[book(9)]);

        carts.clear("alice").await.unwrap();
        assert_eq!(carts.get("bob").await.unwrap().items(), &[book(9)]);
    }

    #[tokio::test]
    async fn test_validation_runs_before_store_access() {
        // A backend that fails every call; validation errors prove the
        // store was never touched.
        let carts = CartStore::new(FailingStore, TTL, OP_TIMEOUT);

        let err = carts.add("", book(7)).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));

        let err = carts.add("alice", book(0)).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));

        let err = carts.add("alice", book(-3)).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));

        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        let err = carts.get(&long).await.unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_store_error() {
        let carts = CartStore::new(FailingStore, TTL, OP_TIMEOUT);

        let err = carts.add("alice", book(7)).await.unwrap_err();
        assert!(matches!(err, CartError::Store(StoreError::Unavailable(_))));

        let err = carts.get("alice").await.unwrap_err();
        assert!(matches!(err, CartError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let carts = CartStore::new(HangingStore, TTL, Duration::from_millis(20));

        let err = carts.get("alice").await.unwrap_err();
        assert!(matches!(err, CartError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_contention_exhausts_bounded_retries() {
        let losing = LosingStore::default();
        let carts = CartStore::new(losing, TTL, OP_TIMEOUT);

        let err = carts.add("alice", book(7)).await.unwrap_err();
        match err {
            CartError::Contention { attempts } => assert_eq!(attempts, MAX_SWAP_ATTEMPTS),
            other => panic!("expected contention, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_add_skips_swap() {
        let backend = CountingStore::new();
        carts_with(&backend).add("alice", book(7)).await.unwrap();
        let swaps_after_first = backend.swaps();

        carts_with(&backend).add("alice", book(7)).await.unwrap();
        assert_eq!(backend.swaps(), swaps_after_first);
    }

    fn carts_with(backend: &CountingStore) -> CartStore<CountingStore> {
        CartStore::new(backend.clone(), TTL, OP_TIMEOUT)
    }

    // ==========================================================================
    // Test doubles
    // ==========================================================================

    /// Backend whose every call fails.
    struct FailingStore;

    impl ExpiringStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("backend down".into()))
        }

        async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("backend down".into()))
        }

        async fn compare_and_swap(
            &self,
            _key: &str,
            _expected: Option<&str>,
            _value: &str,
            _ttl: Duration,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("backend down".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("backend down".into()))
        }
    }

    /// Backend whose calls never complete.
    struct HangingStore;

    impl ExpiringStore for HangingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            std::future::pending().await
        }

        async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
            std::future::pending().await
        }

        async fn compare_and_swap(
            &self,
            _key: &str,
            _expected: Option<&str>,
            _value: &str,
            _ttl: Duration,
        ) -> Result<bool, StoreError> {
            std::future::pending().await
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    /// Backend that loses every compare-and-swap race.
    #[derive(Default)]
    struct LosingStore;

    impl ExpiringStore for LosingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
            Ok(())
        }

        async fn compare_and_swap(
            &self,
            _key: &str,
            _expected: Option<&str>,
            _value: &str,
            _ttl: Duration,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }
    }

    /// Delegates to a `MemoryStore` while counting swap attempts.
    #[derive(Clone)]
    struct CountingStore {
        inner: MemoryStore,
        swap_calls: std::sync::Arc<AtomicU32>,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: MemoryStore::new(),
                swap_calls: std::sync::Arc::new(AtomicU32::new(0)),
            }
        }

        fn swaps(&self) -> u32 {
            self.swap_calls.load(Ordering::SeqCst)
        }
    }

    impl ExpiringStore for CountingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
            self.inner.put(key, value, ttl).await
        }

        async fn compare_and_swap(
            &self,
            key: &str,
            expected: Option<&str>,
            value: &str,
            ttl: Duration,
        ) -> Result<bool, StoreError> {
            self.swap_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.compare_and_swap(key, expected, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
    }
}
