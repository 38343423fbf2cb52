//! Cart error types.

use thiserror::Error;

use super::total::PricingError;
use crate::kv::StoreError;

/// Errors that can occur during cart operations.
///
/// Store-layer failures are recovered into this taxonomy at the cart
/// boundary; the layers above only forward.
#[derive(Debug, Error)]
pub enum CartError {
    /// The expiring store is unreachable or timed out.
    #[error("cart store unavailable: {0}")]
    Store(#[from] StoreError),

    /// Bounded compare-and-swap retries were exhausted. Retryable: the
    /// caller may resubmit the operation.
    #[error("cart update lost {attempts} compare-and-swap races, giving up")]
    Contention {
        /// How many swap attempts were made before giving up.
        attempts: u32,
    },

    /// Malformed input, rejected before any store access.
    #[error("invalid cart request: {0}")]
    Validation(String),

    /// A stored cart record failed to decode.
    #[error("corrupt cart record: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The pricing backend failed while computing a total.
    #[error("price lookup failed: {0}")]
    Pricing(#[from] PricingError),
}
