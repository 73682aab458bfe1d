//! # Error Types
//!
//! The closed error taxonomy of the checkout core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CheckoutError    - The closed taxonomy callers receive            │
//! │  └── ValidationError  - Cart/input precondition failures               │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Storage faults, collapsed into                 │
//! │                         CheckoutError::Persistence at the trait seam   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Errors are enum variants with structured fields, never formatted text
//! 3. Validation failures are detected before any mutation (zero side effects)
//! 4. `Conflict` and `Persistence` are retryable; everything else is terminal
//!    for the request

use thiserror::Error;

// =============================================================================
// Checkout Error
// =============================================================================

/// Errors surfaced by the Order Processor and Stock Adjuster.
///
/// This taxonomy is closed: storage internals never leak past
/// [`CheckoutError::Persistence`].
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A cart line or stock operation referenced a product that does not
    /// exist in the catalog.
    #[error("product not found: {product_id}")]
    ProductNotFound { product_id: String },

    /// No sale exists with the requested id.
    #[error("sale not found: {sale_id}")]
    SaleNotFound { sale_id: String },

    /// No stock movement record exists with the requested id.
    #[error("stock movement not found: {movement_id}")]
    MovementNotFound { movement_id: String },

    /// Requested more units than are on hand.
    ///
    /// Raised during read-only validation, or during the commit phase when a
    /// concurrent checkout consumed the stock first (the guarded decrement
    /// refused to drive stock negative).
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Tendered cash does not cover the cart total.
    #[error("insufficient balance: required {required_cents}, tendered {tendered_cents}")]
    InsufficientBalance {
        required_cents: i64,
        tendered_cents: i64,
    },

    /// A concurrent stock update won the race on this product row.
    /// The whole checkout was rolled back; the caller may retry.
    #[error("concurrent stock update on product {product_id}, retry the request")]
    Conflict { product_id: String },

    /// Opaque storage fault during a read or commit. The commit-phase
    /// rollback guarantees zero partial state; the caller may retry.
    #[error("storage failure: {0}")]
    Persistence(String),

    /// Cart precondition failure (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CheckoutError {
    /// Whether the caller may retry the same request.
    ///
    /// `Conflict` and `Persistence` are transient; every other variant is
    /// terminal for that request.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Conflict { .. } | CheckoutError::Persistence(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Cart and input precondition failures.
///
/// Detected before any store access; a request failing validation has zero
/// side effects.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Checkout requires at least one cart line.
    #[error("cart must contain at least one line")]
    EmptyCart,

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Cart has exceeded the maximum allowed line count.
    #[error("cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CheckoutError.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
