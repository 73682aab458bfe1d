//! # Store Traits
//!
//! The seams between the checkout core and its persistence collaborators.
//!
//! Each collaborator is an explicit polymorphic interface, injected into the
//! orchestrators at construction time - no ambient global connection. The
//! SQLite adapter (`tally-db`) provides the production implementations;
//! [`memory::MemoryStore`] backs the unit tests.
//!
//! ## Concurrency contract
//! Operations that touch the same product's stock must serialize through a
//! single conditional read-modify-write primitive ("apply this delta only if
//! the resulting stock stays non-negative, atomically with the read").
//! Naive read-then-write in two steps is forbidden: it permits overselling
//! under concurrent checkouts. Implementations enforce this with whatever
//! serialization point they own (a SQL transaction, a mutex).

use async_trait::async_trait;

use crate::error::CheckoutError;
use crate::types::{Product, Sale, SaleLine, StockMovement};

pub mod memory;

// =============================================================================
// Catalog collaborator
// =============================================================================

/// Read and stock-mutation access to the product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetches a product by id. `Ok(None)` when absent.
    async fn get(&self, id: &str) -> Result<Option<Product>, CheckoutError>;

    /// Applies `delta` to the product's stock, atomically with the
    /// non-negativity check. Returns the new stock level.
    ///
    /// ## Errors
    /// - [`CheckoutError::ProductNotFound`] when the product is absent
    /// - [`CheckoutError::InsufficientStock`] when the delta would drive
    ///   stock negative (stock is left unchanged)
    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64, CheckoutError>;
}

// =============================================================================
// Ledger collaborator
// =============================================================================

/// Durable storage for committed sales and their lines.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Atomically commits a checkout: one guarded stock decrement per line,
    /// the sale row, and every line row - all or nothing.
    ///
    /// Any failure (a concurrent decrement that would drive stock negative,
    /// a storage fault) rolls back every write of this checkout. No partial
    /// sale is ever observable.
    async fn commit_checkout(&self, sale: &Sale, lines: &[SaleLine]) -> Result<(), CheckoutError>;

    /// Loads a sale and its lines (insertion order). `Ok(None)` when absent.
    async fn get_with_lines(
        &self,
        id: &str,
    ) -> Result<Option<(Sale, Vec<SaleLine>)>, CheckoutError>;
}

// =============================================================================
// Stock movement collaborator
// =============================================================================

/// Storage for inbound replenishment records.
///
/// Record mutation never touches product stock; the Stock Adjuster drives
/// the increment separately through [`ProductStore::adjust_stock`].
#[async_trait]
pub trait StockMovementStore: Send + Sync {
    async fn insert(&self, movement: &StockMovement) -> Result<(), CheckoutError>;

    /// `Ok(None)` when absent.
    async fn get(&self, id: &str) -> Result<Option<StockMovement>, CheckoutError>;

    /// Rewrites an existing record.
    ///
    /// ## Errors
    /// [`CheckoutError::MovementNotFound`] when no record has this id.
    async fn update(&self, movement: &StockMovement) -> Result<(), CheckoutError>;

    /// Removes a record. Does **not** reverse the stock increment the
    /// original receipt caused.
    ///
    /// ## Errors
    /// [`CheckoutError::MovementNotFound`] when no record has this id.
    async fn delete(&self, id: &str) -> Result<(), CheckoutError>;

    /// Lists records, newest first.
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<StockMovement>, CheckoutError>;

    /// All records for one product, newest first. Empty when none exist.
    async fn for_product(&self, product_id: &str) -> Result<Vec<StockMovement>, CheckoutError>;

    async fn count(&self) -> Result<i64, CheckoutError>;
}
