//! Error taxonomy for the checkout engine.
//!
//! Failures map to how they surface at the counter: validation problems
//! block a transition and show an inline message, lookup misses prompt a
//! manual fallback, network problems abort the operation without retry.
//! None of these are fatal to the session; transaction state is preserved
//! by the caller whenever recovery is possible.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Input validation failures. Each variant carries the message shown inline
/// next to the offending field; a validation error never triggers an API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A line needs a product name before it can be accepted.
    #[error("Product name is required")]
    MissingName,

    /// Quantity must be a positive whole number.
    #[error("Quantity must be a positive number")]
    InvalidQuantity,

    /// Price must be zero or more.
    #[error("Price must be zero or a positive number")]
    InvalidPrice,

    /// Per-line discount must be zero or more.
    #[error("Discount must be zero or a positive number")]
    InvalidDiscount,

    /// Quantity/discount edits target a line that is not in the cart.
    #[error("No item with id {id} in the cart")]
    UnknownLine { id: String },

    /// Checkout requires at least one line.
    #[error("Cart is empty, add at least one item first")]
    EmptyCart,

    /// Cash payments need the tendered amount before checkout.
    #[error("Cash received is required for cash payments")]
    MissingCash,

    /// Tendered cash must be a positive amount.
    #[error("Cash received must be greater than zero")]
    NonPositiveCash,

    /// Registering a new member needs a name.
    #[error("Member name is required to register a new member")]
    MissingMemberName,

    /// Member lookup needs a phone number.
    #[error("Member phone number is required")]
    MissingMemberPhone,
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the engine. All are recoverable at the screen level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PosError {
    /// A required field is missing or invalid. Blocks the transition.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Product or member not found by the backend. Not fatal; the caller
    /// falls back to manual entry or registration.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Backend unreachable, timed out, or the request failed before a
    /// response arrived. The operation is aborted; no automatic retry.
    #[error("{0}")]
    Network(String),

    /// Backend answered with a non-success status.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Backend answered 2xx with a body we could not interpret.
    #[error("Invalid response from backend: {0}")]
    InvalidResponse(String),
}

impl PosError {
    /// Lookup misses prompt fallback handling rather than an error notice.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PosError::NotFound { .. })
    }

    /// True when the failure came from transport or the backend, meaning
    /// the entered data is fine and the operator may simply try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, PosError::Network(_) | PosError::Backend { .. })
    }
}

/// Convenience alias used across the crate.
pub type PosResult<T> = Result<T, PosError>;

// ===========================================================================
// Tests
// ===========================================================================
