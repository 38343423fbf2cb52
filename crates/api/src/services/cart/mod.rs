//! Per-user ephemeral carts.
//!
//! A cart is an ordered set of book IDs with a sliding expiration, held in
//! an expiring key-value store rather than the database. [`CartService`] is
//! the façade the HTTP layer talks to; the interesting work happens in
//! [`store::CartStore`] (atomic mutations) and [`total`] (price resolution).

mod error;
pub mod store;
pub mod total;

pub use error::CartError;

use std::time::Duration;

use bramble_core::{BookId, Cents};

use crate::kv::ExpiringStore;
use crate::models::Cart;
use store::CartStore;
use total::{PricingProvider, compute_total};

/// Cart operations exposed to the HTTP boundary.
///
/// Thin composition of [`CartStore`] and the total computation; holds no
/// state of its own.
pub struct CartService<S, P> {
    store: CartStore<S>,
    pricing: P,
}

impl<S: ExpiringStore, P: PricingProvider> CartService<S, P> {
    /// Create a cart service over `backend` and `pricing`.
    pub const fn new(backend: S, pricing: P, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            store: CartStore::new(backend, ttl, op_timeout),
            pricing,
        }
    }

    /// Add a book to the user's cart, returning the new cart state.
    ///
    /// # Errors
    ///
    /// Forwards [`CartError`] from the store layer.
    pub async fn add_book(&self, username: &str, book: BookId) -> Result<Cart, CartError> {
        self.store.add(username, book).await
    }

    /// Remove a book from the user's cart, returning the new cart state.
    ///
    /// # Errors
    ///
    /// Forwards [`CartError`] from the store layer.
    pub async fn remove_book(&self, username: &str, book: BookId) -> Result<Cart, CartError> {
        self.store.remove(username, book).await
    }

    /// Read the user's cart; absent carts read as empty.
    ///
    /// # Errors
    ///
    /// Forwards [`CartError`] from the store layer.
    pub async fn cart(&self, username: &str) -> Result<Cart, CartError> {
        self.store.get(username).await
    }

    /// Drop the user's cart entirely.
    ///
    /// # Errors
    ///
    /// Forwards [`CartError`] from the store layer.
    pub async fn clear(&self, username: &str) -> Result<(), CartError> {
        self.store.clear(username).await
    }

    /// Compute the cart's total in minor currency units.
    ///
    /// Reads one snapshot of the cart, then resolves prices against it; a
    /// concurrent mutation may make the result slightly stale but never
    /// torn, since the store only ever holds fully-written cart values.
    ///
    /// # Errors
    ///
    /// Forwards [`CartError`] from the store and pricing layers.
    pub async fn total(&self, username: &str) -> Result<Cents, CartError> {
        let cart = self.store.get(username).await?;
        compute_total(&self.pricing, &cart).await
    }
}
