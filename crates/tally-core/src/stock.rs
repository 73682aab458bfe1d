//! # Stock Adjuster
//!
//! Applies inbound replenishment events to the catalog outside of a sale,
//! and manages the movement records that document them.
//!
//! The stock increment goes through the same conditional update primitive as
//! the Order Processor's decrements ([`ProductStore::adjust_stock`]), so
//! replenishment and checkout serialize against the same product row.
//!
//! Record maintenance (`update_record` / `delete_record`) never touches
//! product stock. In particular, deleting a movement does not reverse the
//! increment the original receipt caused - a known gap, kept as documented.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::store::{ProductStore, StockMovementStore};
use crate::types::{StockMovement, StockReceipt};
use crate::validation::validate_quantity;

/// Orchestrates replenishment against injected store handles.
pub struct StockAdjuster {
    products: Arc<dyn ProductStore>,
    movements: Arc<dyn StockMovementStore>,
}

impl StockAdjuster {
    /// Creates an adjuster over the given collaborators.
    pub fn new(products: Arc<dyn ProductStore>, movements: Arc<dyn StockMovementStore>) -> Self {
        StockAdjuster {
            products,
            movements,
        }
    }

    /// Receives inbound stock: increments the product's on-hand count and
    /// persists a movement record documenting the receipt.
    pub async fn receive_stock(&self, receipt: StockReceipt) -> CheckoutResult<StockMovement> {
        validate_quantity(receipt.quantity)?;

        let product = self
            .products
            .get(&receipt.product_id)
            .await?
            .ok_or_else(|| CheckoutError::ProductNotFound {
                product_id: receipt.product_id.clone(),
            })?;

        let new_stock = self
            .products
            .adjust_stock(&receipt.product_id, receipt.quantity)
            .await?;

        if new_stock < product.minimum_stock {
            warn!(
                product_id = %receipt.product_id,
                stock = new_stock,
                minimum = product.minimum_stock,
                "product still below minimum stock after receiving"
            );
        }

        let now = Utc::now();
        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            product_id: receipt.product_id,
            quantity: receipt.quantity,
            base_price_cents: receipt.base_price_cents,
            sell_price_cents: receipt.sell_price_cents,
            received_at: receipt.received_at,
            note: receipt.note,
            created_at: now,
            updated_at: now,
        };
        self.movements.insert(&movement).await?;

        info!(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            quantity = movement.quantity,
            stock = new_stock,
            "stock received"
        );
        Ok(movement)
    }

    /// Loads a movement record by id.
    pub async fn get_record(&self, id: &str) -> CheckoutResult<StockMovement> {
        self.movements
            .get(id)
            .await?
            .ok_or_else(|| CheckoutError::MovementNotFound {
                movement_id: id.to_string(),
            })
    }

    /// Rewrites an existing movement record from a new receipt.
    ///
    /// Re-validates that both the record and the referenced product exist.
    /// Product stock is not adjusted: the record is documentation, the
    /// increment already happened at receive time.
    pub async fn update_record(
        &self,
        id: &str,
        receipt: StockReceipt,
    ) -> CheckoutResult<StockMovement> {
        validate_quantity(receipt.quantity)?;

        let existing = self.get_record(id).await?;

        if self.products.get(&receipt.product_id).await?.is_none() {
            return Err(CheckoutError::ProductNotFound {
                product_id: receipt.product_id,
            });
        }

        let movement = StockMovement {
            id: existing.id,
            product_id: receipt.product_id,
            quantity: receipt.quantity,
            base_price_cents: receipt.base_price_cents,
            sell_price_cents: receipt.sell_price_cents,
            received_at: receipt.received_at,
            note: receipt.note,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.movements.update(&movement).await?;

        debug!(movement_id = %movement.id, "stock movement updated");
        Ok(movement)
    }

    /// Deletes a movement record.
    ///
    /// The product stock increment from the original receipt is **not**
    /// reversed.
    pub async fn delete_record(&self, id: &str) -> CheckoutResult<()> {
        // Existence check first so callers get MovementNotFound rather than
        // an adapter-specific error shape.
        self.get_record(id).await?;
        self.movements.delete(id).await?;

        debug!(movement_id = %id, "stock movement deleted");
        Ok(())
    }

    /// Lists movement records, newest first.
    pub async fn list_records(&self, limit: u32, offset: u32) -> CheckoutResult<Vec<StockMovement>> {
        self.movements.list(limit, offset).await
    }

    /// All movement records for one product, newest first.
    pub async fn records_for_product(
        &self,
        product_id: &str,
    ) -> CheckoutResult<Vec<StockMovement>> {
        self.movements.for_product(product_id).await
    }

    /// Total number of movement records.
    pub async fn count_records(&self) -> CheckoutResult<i64> {
        self.movements.count().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::OrderProcessor;
    use crate::money::Money;
    use crate::store::memory::MemoryStore;
    use crate::store::SaleStore;
    use crate::types::{CartLine, Product};

    fn product(id: &str, stock: i64, minimum: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            sell_price_cents: 500,
            base_price_cents: 300,
            stock,
            minimum_stock: minimum,
            created_at: now,
            updated_at: now,
        }
    }

    fn receipt(product_id: &str, quantity: i64) -> StockReceipt {
        StockReceipt {
            product_id: product_id.to_string(),
            quantity,
            base_price_cents: 300,
            sell_price_cents: 500,
            received_at: Utc::now(),
            note: Some("weekly delivery".to_string()),
        }
    }

    fn adjuster(store: &Arc<MemoryStore>) -> StockAdjuster {
        StockAdjuster::new(
            Arc::clone(store) as Arc<dyn ProductStore>,
            Arc::clone(store) as Arc<dyn StockMovementStore>,
        )
    }

    #[tokio::test]
    async fn test_receive_increments_and_records() {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(product("p1", 2, 0));
        let adj = adjuster(&store);

        let movement = adj.receive_stock(receipt("p1", 8)).await.unwrap();

        assert_eq!(store.stock_of("p1"), Some(10));
        assert_eq!(movement.quantity, 8);
        assert_eq!(adj.count_records().await.unwrap(), 1);
        assert_eq!(adj.get_record(&movement.id).await.unwrap().id, movement.id);
    }

    #[tokio::test]
    async fn test_receive_unknown_product() {
        let store = Arc::new(MemoryStore::new());
        let adj = adjuster(&store);

        let err = adj.receive_stock(receipt("ghost", 5)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound { .. }));
        assert_eq!(adj.count_records().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_receive_rejects_non_positive_quantity() {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(product("p1", 2, 0));
        let adj = adjuster(&store);

        let err = adj.receive_stock(receipt("p1", 0)).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(store.stock_of("p1"), Some(2));
    }

    #[tokio::test]
    async fn test_update_record_revalidates_and_keeps_stock() {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(product("p1", 0, 0));
        let adj = adjuster(&store);

        let movement = adj.receive_stock(receipt("p1", 5)).await.unwrap();
        assert_eq!(store.stock_of("p1"), Some(5));

        let updated = adj
            .update_record(&movement.id, receipt("p1", 3))
            .await
            .unwrap();
        assert_eq!(updated.quantity, 3);
        // Rewriting the record never re-adjusts the product.
        assert_eq!(store.stock_of("p1"), Some(5));

        let err = adj
            .update_record("missing", receipt("p1", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::MovementNotFound { .. }));

        let err = adj
            .update_record(&movement.id, receipt("ghost", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_record_does_not_reverse_increment() {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(product("p1", 1, 0));
        let adj = adjuster(&store);

        let movement = adj.receive_stock(receipt("p1", 9)).await.unwrap();
        assert_eq!(store.stock_of("p1"), Some(10));

        adj.delete_record(&movement.id).await.unwrap();

        // Record gone, increment intentionally kept.
        assert_eq!(adj.count_records().await.unwrap(), 0);
        assert_eq!(store.stock_of("p1"), Some(10));

        let err = adj.delete_record(&movement.id).await.unwrap_err();
        assert!(matches!(err, CheckoutError::MovementNotFound { .. }));
    }

    #[tokio::test]
    async fn test_records_for_product_and_list() {
        let store = Arc::new(MemoryStore::new());
        store.insert_product(product("p1", 0, 0));
        store.insert_product(product("p2", 0, 0));
        let adj = adjuster(&store);

        adj.receive_stock(receipt("p1", 1)).await.unwrap();
        adj.receive_stock(receipt("p2", 2)).await.unwrap();
        adj.receive_stock(receipt("p1", 3)).await.unwrap();

        let p1_records = adj.records_for_product("p1").await.unwrap();
        assert_eq!(p1_records.len(), 2);
        assert_eq!(p1_records[0].quantity, 3); // newest first

        assert!(adj.records_for_product("ghost").await.unwrap().is_empty());
        assert_eq!(adj.list_records(2, 0).await.unwrap().len(), 2);
        assert_eq!(adj.list_records(10, 2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conservation_across_receipts_and_checkouts() {
        // stock_after = stock_before + Σ receipts − Σ successful orders
        let store = Arc::new(MemoryStore::new());
        store.insert_product(product("p1", 5, 0));
        let adj = adjuster(&store);
        let proc = OrderProcessor::new(
            Arc::clone(&store) as Arc<dyn ProductStore>,
            Arc::clone(&store) as Arc<dyn SaleStore>,
        );

        adj.receive_stock(receipt("p1", 10)).await.unwrap(); // 15
        proc.create_order(&[CartLine::new("p1", 4)], Money::from_cents(10_000))
            .await
            .unwrap(); // 11
        adj.receive_stock(receipt("p1", 2)).await.unwrap(); // 13
        proc.create_order(&[CartLine::new("p1", 6)], Money::from_cents(10_000))
            .await
            .unwrap(); // 7

        // A failed order contributes nothing.
        let err = proc
            .create_order(&[CartLine::new("p1", 50)], Money::from_cents(100_000))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

        assert_eq!(store.stock_of("p1"), Some(5 + 10 + 2 - 4 - 6));
    }
}
