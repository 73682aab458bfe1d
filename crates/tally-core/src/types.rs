//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sell_price     │   │  line_count     │   │  sale_id (FK)   │       │
//! │  │  stock (≥ 0)    │   │  amount_cents   │   │  product_id(FK) │       │
//! │  │  minimum_stock  │   │  timestamps     │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  StockMovement  │   │    CartLine     │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  replenishment  │   │  ephemeral      │                             │
//! │  │  record         │   │  request input  │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `Sale` and its `SaleLine`s exist together or not at all; the commit is
//! atomic with the stock decrements it implies. `CartLine` is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// This core never creates or destroys products (catalog CRUD is an external
/// collaborator); it only mutates `stock` through the conditional stock-delta
/// primitive exposed by [`crate::store::ProductStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit sell price in cents (smallest currency unit).
    pub sell_price_cents: i64,

    /// Base (cost) price in cents.
    pub base_price_cents: i64,

    /// On-hand stock. Never negative; the storage layer enforces this.
    pub stock: i64,

    /// Reorder threshold. Purely advisory for this core.
    pub minimum_stock: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the sell price as a Money type.
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    /// Returns the base (cost) price as a Money type.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }

    /// Checks whether on-hand stock has fallen below the reorder threshold.
    #[inline]
    pub fn is_below_minimum(&self) -> bool {
        self.stock < self.minimum_stock
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A single requested line of a cart: product and quantity.
///
/// Ephemeral input to checkout; never persisted directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Created exactly once per successful checkout and
/// immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Number of lines in the sale.
    pub line_count: i64,
    /// Total amount in cents, fixed at validation time.
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the sale total as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Sale Line
// =============================================================================

/// A line item of a committed sale.
///
/// Owned exclusively by its sale (cascade-deleted with it). Carries no price
/// snapshot: the owning sale's `amount_cents` is the validation-time total,
/// and line→product resolution happens against current catalog state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// An inbound replenishment event adjusting a product's on-hand stock.
///
/// Deleting a movement record does **not** reverse the stock increment it
/// originally caused (a known, documented gap).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    /// Units received.
    pub quantity: i64,
    /// Unit cost price at receiving time, in cents.
    pub base_price_cents: i64,
    /// Unit sell price at receiving time, in cents.
    pub sell_price_cents: i64,
    /// When the goods were received.
    pub received_at: DateTime<Utc>,
    /// Free-form note (supplier, delivery reference, ...).
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for receiving or rewriting a stock movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReceipt {
    pub product_id: String,
    pub quantity: i64,
    pub base_price_cents: i64,
    pub sell_price_cents: i64,
    pub received_at: DateTime<Utc>,
    pub note: Option<String>,
}

// =============================================================================
// Views & Outcomes
// =============================================================================

/// A sale line resolved against the *current* catalog state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineView {
    pub line: SaleLine,
    pub product: Product,
}

/// A sale with its lines, each resolved to the current product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleView {
    pub sale: Sale,
    pub lines: Vec<SaleLineView>,
}

/// Result of a successful checkout: the persisted sale, its lines, and the
/// change due back to the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutOutcome {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    pub change: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
