//! Cart route handlers.
//!
//! Every endpoint is keyed by the authenticated username; the handlers never
//! accept a user identifier from the request. Mutations return the new cart
//! state. Contention and store outages surface as errors (409 / 503) rather
//! than a silently wrong cart - only the plain read may degrade to an empty
//! cart, and only when the deployment opts in via `CART_DEGRADED_READS`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use bramble_core::BookId;

use crate::db::books::BookRepository;
use crate::error::{ApiError, Result};
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::services::cart::CartError;
use crate::state::AppState;

/// Cart total in both representations.
///
/// `total_cents` is the exact integer the payment layer consumes; `total`
/// is the major-unit rendering for display.
#[derive(Debug, Serialize)]
pub struct TotalResponse {
    pub total_cents: i64,
    pub total: Decimal,
}

/// Read the current user's cart.
#[instrument(skip(state, user))]
pub async fn show(State(state): State<AppState>, user: RequireAuth) -> Result<Json<Cart>> {
    let RequireAuth(user) = user;

    match state.carts().cart(&user.username).await {
        Ok(cart) => Ok(Json(cart)),
        // Documented fallback: a degraded read is preferable to an outage
        // for this endpoint, but only when explicitly configured.
        Err(CartError::Store(err)) if state.config().cart.degraded_reads => {
            tracing::warn!(error = %err, "cart store unavailable, serving empty cart");
            Ok(Json(Cart::new()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Add a book to the current user's cart.
///
/// Returns the new cart state; adding a book that is already present is a
/// no-op, not an error. The book must exist in the catalog.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(book_id): Path<i32>,
) -> Result<Json<Cart>> {
    let RequireAuth(user) = user;
    let book_id = BookId::new(book_id);

    let book = BookRepository::new(state.pool())
        .get(book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {book_id}")))?;

    let cart = state.carts().add_book(&user.username, book.id).await?;
    Ok(Json(cart))
}

/// Remove a book from the current user's cart.
///
/// Returns the new cart state; removing an absent book is a no-op.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    user: RequireAuth,
    Path(book_id): Path<i32>,
) -> Result<Json<Cart>> {
    let RequireAuth(user) = user;

    let cart = state
        .carts()
        .remove_book(&user.username, BookId::new(book_id))
        .await?;
    Ok(Json(cart))
}

/// Clear the current user's cart.
#[instrument(skip(state, user))]
pub async fn clear(State(state): State<AppState>, user: RequireAuth) -> Result<StatusCode> {
    let RequireAuth(user) = user;

    state.carts().clear(&user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Compute the current user's cart total.
#[instrument(skip(state, user))]
pub async fn total(State(state): State<AppState>, user: RequireAuth) -> Result<Json<TotalResponse>> {
    let RequireAuth(user) = user;

    let total = state.carts().total(&user.username).await?;
    Ok(Json(TotalResponse {
        total_cents: total.as_i64(),
        total: total.to_major(),
    }))
}
