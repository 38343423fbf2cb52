//! Cart total computation.
//!
//! Totals are computed lazily at request time: each book in the cart is
//! resolved to its current unit price and the prices are summed in exact
//! integer minor units. Books that have vanished from the catalog since they
//! were added contribute nothing and do not abort the computation; carts are
//! never reconciled against catalog changes, so a stale entry is expected.
//! A price seen at add time and the price charged at checkout can differ;
//! that staleness is accepted, prices are never cached here.

use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use bramble_core::{BookId, Cents};

use super::error::CartError;
use crate::db::books::BookRepository;
use crate::models::Cart;

/// Error from a pricing backend.
///
/// A missing book is NOT an error; this only covers backend failures.
#[derive(Debug, Error)]
pub enum PricingError {
    /// The backend could not be queried.
    #[error("pricing backend failure: {0}")]
    Backend(String),
}

/// Source of current unit prices.
pub trait PricingProvider: Send + Sync {
    /// Resolve the current unit price for `book`.
    ///
    /// `Ok(None)` means the book no longer exists, which is a normal
    /// outcome the caller handles by skipping.
    async fn unit_price(&self, book: BookId) -> Result<Option<Cents>, PricingError>;
}

/// Sum the current prices of every book in `cart`.
///
/// # Errors
///
/// Returns [`CartError::Pricing`] only when the backend itself fails;
/// unresolvable books are skipped silently.
pub async fn compute_total<P: PricingProvider>(
    pricing: &P,
    cart: &Cart,
) -> Result<Cents, CartError> {
    let mut total = Cents::ZERO;

    for book in cart.iter() {
        match pricing.unit_price(book).await? {
            Some(price) => total = total.saturating_add(price),
            None => debug!(book = %book, "book no longer in catalog, skipped in total"),
        }
    }

    Ok(total)
}

/// [`PricingProvider`] backed by the live catalog table.
#[derive(Debug, Clone)]
pub struct CatalogPricing {
    pool: PgPool,
}

impl CatalogPricing {
    /// Create a provider over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PricingProvider for CatalogPricing {
    async fn unit_price(&self, book: BookId) -> Result<Option<Cents>, PricingError> {
        BookRepository::new(&self.pool)
            .price(book)
            .await
            .map_err(|e| PricingError::Backend(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Fixed price table for tests.
    struct StaticPricing {
        prices: HashMap<BookId, Cents>,
        healthy: bool,
    }

    impl StaticPricing {
        fn new(prices: &[(i32, i64)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|&(id, cents)| (BookId::new(id), Cents::new(cents)))
                    .collect(),
                healthy: true,
            }
        }

        fn broken() -> Self {
            Self {
                prices: HashMap::new(),
                healthy: false,
            }
        }
    }

    impl PricingProvider for StaticPricing {
        async fn unit_price(&self, book: BookId) -> Result<Option<Cents>, PricingError> {
            if !self.healthy {
                return Err(PricingError::Backend("catalog down".into()));
            }
            Ok(self.prices.get(&book).copied())
        }
    }

    fn cart_of(ids: &[i32]) -> Cart {
        ids.iter().map(|&id| BookId::new(id)).collect()
    }

    #[tokio::test]
    async fn test_empty_cart_totals_zero() {
        let pricing = StaticPricing::new(&[(1, 500)]);
        let total = compute_total(&pricing, &Cart::new()).await.unwrap();
        assert_eq!(total, Cents::ZERO);
    }

    #[tokio::test]
    async fn test_total_sums_unit_prices() {
        let pricing = StaticPricing::new(&[(1, 500), (2, 1250), (3, 99)]);
        let total = compute_total(&pricing, &cart_of(&[1, 2, 3])).await.unwrap();
        assert_eq!(total, Cents::new(1849));
    }

    #[tokio::test]
    async fn test_vanished_books_are_skipped() {
        // Book 2 was deleted from the catalog after being added to the cart.
        let pricing = StaticPricing::new(&[(1, 500)]);
        let total = compute_total(&pricing, &cart_of(&[1, 2])).await.unwrap();
        assert_eq!(total, Cents::new(500));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let pricing = StaticPricing::broken();
        let err = compute_total(&pricing, &cart_of(&[1])).await.unwrap_err();
        assert!(matches!(err, CartError::Pricing(PricingError::Backend(_))));
    }
}
