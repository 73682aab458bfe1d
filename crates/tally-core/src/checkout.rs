//! # Order Processor
//!
//! Validates a multi-line cart against the catalog, computes the total, and
//! drives the atomic commit across the catalog and ledger stores.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        create_order                                     │
//! │                                                                         │
//! │  cart lines + tendered cash                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. PRECONDITIONS (no store access)                                    │
//! │     └── non-empty cart, positive quantities, caps                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. VALIDATION (read-only)                                             │
//! │     ├── fetch every product ── missing? ──► ProductNotFound            │
//! │     ├── stock < quantity?    ───────────► InsufficientStock            │
//! │     └── total += quantity × sell_price                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. tendered < total? ──────────────────► InsufficientBalance          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. COMMIT (atomic, all or nothing)                                    │
//! │     ├── guarded stock decrement per line                               │
//! │     ├── insert Sale row                                                │
//! │     └── insert SaleLine rows                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CheckoutOutcome { sale, lines, change = tendered − total }            │
//! │                                                                         │
//! │  Single-shot: Pending(cart) → Committed | Rejected. A rejected         │
//! │  checkout leaves zero side effects; a commit-phase failure rolls       │
//! │  back every write of this checkout.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The validation-phase stock read is advisory: two checkouts racing over
//! the same product can both pass it. The commit-phase guarded decrement is
//! authoritative, so exactly one of them commits and the other is rejected.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Money;
use crate::store::{ProductStore, SaleStore};
use crate::types::{CartLine, CheckoutOutcome, Sale, SaleLine, SaleLineView, SaleView};
use crate::validation::validate_cart;

/// Orchestrates checkout against injected store handles.
///
/// ## Usage
/// ```rust,ignore
/// let processor = OrderProcessor::new(products, sales);
/// let outcome = processor
///     .create_order(&[CartLine::new(product_id, 3)], Money::from_cents(2000))
///     .await?;
/// println!("change due: {}", outcome.change);
/// ```
pub struct OrderProcessor {
    products: Arc<dyn ProductStore>,
    sales: Arc<dyn SaleStore>,
}

impl OrderProcessor {
    /// Creates a processor over the given collaborators.
    pub fn new(products: Arc<dyn ProductStore>, sales: Arc<dyn SaleStore>) -> Self {
        OrderProcessor { products, sales }
    }

    /// Runs a full checkout: validate every line, check tendered cash, and
    /// atomically commit the sale with its stock decrements.
    ///
    /// On success returns the persisted sale, its lines, and the change due
    /// (`tendered − total`). On any error, no state was changed.
    pub async fn create_order(
        &self,
        lines: &[CartLine],
        tendered: Money,
    ) -> CheckoutResult<CheckoutOutcome> {
        validate_cart(lines)?;

        debug!(lines = lines.len(), tendered = %tendered, "validating cart");

        // Validation phase: read-only, fail fast with zero side effects.
        let mut total = Money::zero();
        for line in lines {
            let product = self.products.get(&line.product_id).await?.ok_or_else(|| {
                CheckoutError::ProductNotFound {
                    product_id: line.product_id.clone(),
                }
            })?;

            if product.stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            let line_cost = product
                .sell_price()
                .checked_mul(line.quantity)
                .and_then(|cost| total.checked_add(cost))
                .ok_or_else(|| CheckoutError::Persistence("cart total overflow".to_string()))?;
            total = line_cost;
        }

        if tendered < total {
            return Err(CheckoutError::InsufficientBalance {
                required_cents: total.cents(),
                tendered_cents: tendered.cents(),
            });
        }

        // Commit phase: the sale store runs decrements + inserts atomically.
        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            line_count: lines.len() as i64,
            amount_cents: total.cents(),
            created_at: now,
            updated_at: now,
        };
        let sale_lines: Vec<SaleLine> = lines
            .iter()
            .map(|line| SaleLine {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
            })
            .collect();

        if let Err(err) = self.sales.commit_checkout(&sale, &sale_lines).await {
            warn!(sale_id = %sale.id, error = %err, retryable = err.is_retryable(), "checkout commit rejected");
            return Err(err);
        }

        let change = tendered - total;
        info!(
            sale_id = %sale.id,
            amount = %total,
            change = %change,
            lines = sale_lines.len(),
            "sale committed"
        );

        Ok(CheckoutOutcome {
            sale,
            lines: sale_lines,
            change,
        })
    }

    /// Loads a committed sale with its lines, resolving each line's product
    /// reference to the *current* catalog state (not a sale-time snapshot).
    pub async fn get_order(&self, id: &str) -> CheckoutResult<SaleView> {
        let (sale, lines) = self.sales.get_with_lines(id).await?.ok_or_else(|| {
            CheckoutError::SaleNotFound {
                sale_id: id.to_string(),
            }
        })?;

        let mut views = Vec::with_capacity(lines.len());
        for line in lines {
            let product = self.products.get(&line.product_id).await?.ok_or_else(|| {
                CheckoutError::ProductNotFound {
                    product_id: line.product_id.clone(),
                }
            })?;
            views.push(SaleLineView { line, product });
        }

        Ok(SaleView { sale, lines: views })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
