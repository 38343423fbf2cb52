//! Stripe Checkout client.
//!
//! Creates hosted Checkout Sessions for cart totals. The only obligation
//! here is to hand Stripe an already-computed integer amount in minor units
//! and return the redirect URL; cart math never happens in this module.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use bramble_core::Cents;

use crate::config::StripeConfig;

/// Stripe API base URL.
const BASE_URL: &str = "https://api.stripe.com/v1";

/// Product label shown on the hosted checkout page.
const PRODUCT_NAME: &str = "Bramble Books order";

/// Errors that can occur when interacting with the Stripe API.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to interpret a response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Stripe Checkout API client.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    currency: String,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StripeConfig) -> Result<Self, CheckoutError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| CheckoutError::Parse(format!("invalid secret key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            currency: config.currency.clone(),
        })
    }

    /// Create a Checkout Session for `amount` and return its redirect URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the response carries no
    /// redirect URL.
    pub async fn create_checkout_session(
        &self,
        amount: Cents,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String, CheckoutError> {
        let url = format!("{BASE_URL}/checkout/sessions");

        // Stripe's API takes form-encoded bodies with bracketed keys.
        let amount_minor = amount.as_i64().to_string();
        let params: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("payment_method_types[0]", "card"),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &self.currency),
            ("line_items[0][price_data][unit_amount]", &amount_minor),
            ("line_items[0][price_data][product_data][name]", PRODUCT_NAME),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CheckoutError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| CheckoutError::Parse(e.to_string()))?;

        session
            .url
            .ok_or_else(|| CheckoutError::Parse("checkout session has no redirect url".to_owned()))
    }
}

/// The slice of a Checkout Session response we care about.
#[derive(Debug, Deserialize)]
struct CheckoutSession {
    url: Option<String>,
}
