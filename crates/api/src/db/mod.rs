//! Database operations for the bookshop `PostgreSQL` instance.
//!
//! ## Tables
//!
//! - `book` - Catalog books with prices in minor units
//! - `app_user` - Registered users and their password hashes
//! - `tower_sessions.session` - Session storage (created by the session
//!   store's own migration)
//!
//! Carts are deliberately NOT here: they live in the expiring key-value
//! store and vanish when their TTL lapses.
//!
//! # Migrations
//!
//! Embedded from `crates/api/migrations/` and run on startup.

pub mod books;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness or integrity constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value could not be interpreted.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
