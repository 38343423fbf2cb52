//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::kv::MemoryStore;
use crate::services::cart::CartService;
use crate::services::cart::total::CatalogPricing;
use crate::services::checkout::{CheckoutError, StripeClient};

/// The cart service as wired in production: in-process expiring store,
/// prices resolved from the live catalog.
pub type AppCartService = CartService<MemoryStore, CatalogPricing>;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to shared resources like the
/// database pool and the cart service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    carts: AppCartService,
    checkout: StripeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Stripe client cannot be built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, CheckoutError> {
        let checkout = StripeClient::new(&config.stripe)?;
        let carts = CartService::new(
            MemoryStore::new(),
            CatalogPricing::new(pool.clone()),
            config.cart.ttl,
            config.cart.op_timeout,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
                checkout,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &AppCartService {
        &self.inner.carts
    }

    /// Get a reference to the Stripe checkout client.
    #[must_use]
    pub fn checkout(&self) -> &StripeClient {
        &self.inner.checkout
    }
}
