//! Payment route handlers.
//!
//! The checkout endpoint computes the cart total and hands it, already in
//! minor units, to the Stripe client. Success/cancel are plain landing
//! endpoints Stripe redirects back to.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::{ApiError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Checkout session response body.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Stripe-hosted checkout URL to redirect the user to.
    pub url: String,
}

/// Plain message response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Create a Stripe checkout session for the current user's cart.
#[instrument(skip(state, user))]
pub async fn checkout(
    State(state): State<AppState>,
    user: RequireAuth,
) -> Result<Json<CheckoutResponse>> {
    let RequireAuth(user) = user;

    let total = state.carts().total(&user.username).await?;
    if total.is_zero() {
        return Err(ApiError::BadRequest("cart is empty".into()));
    }

    let base = state.config().base_url.trim_end_matches('/');
    let success_url = format!("{base}/api/payment/success");
    let cancel_url = format!("{base}/api/payment/cancel");

    let url = state
        .checkout()
        .create_checkout_session(total, &success_url, &cancel_url)
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// Checkout success landing.
pub async fn success() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Payment successful!",
    })
}

/// Checkout cancel landing.
pub async fn cancel() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Payment cancelled.",
    })
}
