//! # Validation Module
//!
//! Cart precondition checks, run before any store access.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE - structural preconditions                       │
//! │  ├── cart non-empty, quantities positive, caps respected               │
//! │  └── zero side effects on failure                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: OrderProcessor - business rules against live state           │
//! │  ├── product exists, stock sufficient, cash covers total               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Storage - CHECK (stock >= 0), FK constraints, atomic commit  │
//! │                                                                         │
//! │  Defense in depth: the commit-phase guard is authoritative even when   │
//! │  Layer 2 passed, because concurrent checkouts can race.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::CartLine;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a cart before checkout.
///
/// ## Rules
/// - At least one line
/// - At most [`MAX_CART_LINES`] lines
/// - Every quantity strictly positive and at most [`MAX_LINE_QUANTITY`]
///
/// ## Example
/// ```rust
/// use tally_core::types::CartLine;
/// use tally_core::validation::validate_cart;
///
/// assert!(validate_cart(&[CartLine::new("p1", 3)]).is_ok());
/// assert!(validate_cart(&[]).is_err());
/// assert!(validate_cart(&[CartLine::new("p1", 0)]).is_err());
/// ```
pub fn validate_cart(lines: &[CartLine]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::CartTooLarge {
            max: MAX_CART_LINES,
        });
    }

    for line in lines {
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

/// Validates a single quantity (cart line or stock receipt).
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_LINE_QUANTITY {
        return Err(ValidationError::QuantityTooLarge {
            requested: quantity,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
