//! # tally-core: Checkout Core for Tally POS
//!
//! This crate is the **heart** of Tally POS: the order-processing subsystem
//! of a point-of-sale backend. It validates multi-line carts against live
//! inventory, computes totals in integer cents, and drives the atomic commit
//! of a sale (stock decrements + sale row + line rows, all or nothing).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Caller (HTTP handler, CLI - out of scope)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  checkout  │  │   stock   │  │   │
//! │  │   │  Product  │  │   Money   │  │   Order    │  │   Stock   │  │   │
//! │  │   │   Sale    │  │  (cents)  │  │ Processor  │  │ Adjuster  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────┬──────┘  └─────┬─────┘  │   │
//! │  │                                       │               │        │   │
//! │  │   ┌───────────────────────────────────▼───────────────▼─────┐  │   │
//! │  │   │  store: ProductStore / SaleStore / StockMovementStore   │  │   │
//! │  │   │  (trait seams; store::memory for tests)                 │  │   │
//! │  │   └─────────────────────────────────────────────────────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (SQLite adapter)                    │   │
//! │  │          pool, migrations, repositories over sqlx               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleLine, StockMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - The closed checkout error taxonomy
//! - [`validation`] - Cart precondition checks
//! - [`store`] - Collaborator trait seams + in-memory implementation
//! - [`checkout`] - The Order Processor
//! - [`stock`] - The Stock Adjuster
//!
//! ## Design Principles
//!
//! 1. **No concrete I/O**: persistence is reached only through injected
//!    store handles - no ambient global connection
//! 2. **Integer money**: all monetary values are cents (i64)
//! 3. **Closed errors**: callers see the [`error::CheckoutError`] taxonomy,
//!    never storage internals or formatted strings
//! 4. **All-or-nothing commits**: a rejected checkout has zero side effects

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod stock;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::OrderProcessor;
pub use error::{CheckoutError, CheckoutResult, ValidationError};
pub use money::Money;
pub use stock::StockAdjuster;
pub use store::{ProductStore, SaleStore, StockMovementStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
///
/// Prevents runaway carts and keeps transaction sizes reasonable.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
