//! In-memory store implementation.
//!
//! One `MemoryStore` implements all three collaborator traits over plain
//! maps behind a single mutex. The mutex is the serialization point: a
//! checkout commit holds it across the stock checks and all inserts, so the
//! commit is atomic and same-product operations cannot interleave.
//!
//! Used by the unit tests in this crate; also handy for callers that want a
//! throwaway backend (demos, benchmarks).

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::CheckoutError;
use crate::store::{ProductStore, SaleStore, StockMovementStore};
use crate::types::{Product, Sale, SaleLine, StockMovement};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<String, Product>,
    sales: HashMap<String, Sale>,
    sale_lines: Vec<SaleLine>,
    movements: HashMap<String, StockMovement>,
    movement_order: Vec<String>,
}

/// In-memory implementation of all store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned mutex means a test already panicked; propagating the
        // panic here is the right behavior for a test double.
        self.inner.lock().expect("memory store mutex poisoned")
    }

    /// Seeds a product (the catalog collaborator's write path, out of scope
    /// for the checkout core itself).
    pub fn insert_product(&self, product: Product) {
        self.lock().products.insert(product.id.clone(), product);
    }

    /// Current stock of a product, for test assertions.
    pub fn stock_of(&self, id: &str) -> Option<i64> {
        self.lock().products.get(id).map(|p| p.stock)
    }

    /// Number of committed sales, for test assertions.
    pub fn sale_count(&self) -> usize {
        self.lock().sales.len()
    }

    /// Number of persisted sale lines, for test assertions.
    pub fn sale_line_count(&self) -> usize {
        self.lock().sale_lines.len()
    }
}

fn apply_delta(inner: &mut Inner, id: &str, delta: i64) -> Result<i64, CheckoutError> {
    let product = inner
        .products
        .get_mut(id)
        .ok_or_else(|| CheckoutError::ProductNotFound {
            product_id: id.to_string(),
        })?;

    let new_stock = product.stock + delta;
    if new_stock < 0 {
        return Err(CheckoutError::InsufficientStock {
            product_id: id.to_string(),
            requested: -delta,
            available: product.stock,
        });
    }

    product.stock = new_stock;
    product.updated_at = Utc::now();
    Ok(new_stock)
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<Product>, CheckoutError> {
        Ok(self.lock().products.get(id).cloned())
    }

    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64, CheckoutError> {
        apply_delta(&mut self.lock(), id, delta)
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn commit_checkout(&self, sale: &Sale, lines: &[SaleLine]) -> Result<(), CheckoutError> {
        let mut inner = self.lock();

        // Guard pass first: nothing is mutated until every line can commit.
        for line in lines {
            let product = inner.products.get(&line.product_id).ok_or_else(|| {
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
        }

        for line in lines {
            // Cannot fail: guarded above and the lock is still held.
            apply_delta(&mut inner, &line.product_id, -line.quantity)?;
        }

        inner.sales.insert(sale.id.clone(), sale.clone());
        inner.sale_lines.extend(lines.iter().cloned());
        Ok(())
    }

    async fn get_with_lines(
        &self,
        id: &str,
    ) -> Result<Option<(Sale, Vec<SaleLine>)>, CheckoutError> {
        let inner = self.lock();
        let Some(sale) = inner.sales.get(id).cloned() else {
            return Ok(None);
        };
        let lines = inner
            .sale_lines
            .iter()
            .filter(|l| l.sale_id == id)
            .cloned()
            .collect();
        Ok(Some((sale, lines)))
    }
}

#[async_trait]
impl StockMovementStore for MemoryStore {
    async fn insert(&self, movement: &StockMovement) -> Result<(), CheckoutError> {
        let mut inner = self.lock();
        inner
            .movements
            .insert(movement.id.clone(), movement.clone());
        inner.movement_order.push(movement.id.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StockMovement>, CheckoutError> {
        Ok(self.lock().movements.get(id).cloned())
    }

    async fn update(&self, movement: &StockMovement) -> Result<(), CheckoutError> {
        let mut inner = self.lock();
        if !inner.movements.contains_key(&movement.id) {
            return Err(CheckoutError::MovementNotFound {
                movement_id: movement.id.clone(),
            });
        }
        inner
            .movements
            .insert(movement.id.clone(), movement.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), CheckoutError> {
        let mut inner = self.lock();
        if inner.movements.remove(id).is_none() {
            return Err(CheckoutError::MovementNotFound {
                movement_id: id.to_string(),
            });
        }
        inner.movement_order.retain(|m| m != id);
        Ok(())
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<StockMovement>, CheckoutError> {
        let inner = self.lock();
        Ok(inner
            .movement_order
            .iter()
            .rev()
            .skip(offset as usize)
            .take(limit as usize)
            .filter_map(|id| inner.movements.get(id).cloned())
            .collect())
    }

    async fn for_product(&self, product_id: &str) -> Result<Vec<StockMovement>, CheckoutError> {
        let inner = self.lock();
        Ok(inner
            .movement_order
            .iter()
            .rev()
            .filter_map(|id| inner.movements.get(id))
            .filter(|m| m.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, CheckoutError> {
        Ok(self.lock().movements.len() as i64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            sell_price_cents: 500,
            base_price_cents: 300,
            stock,
            minimum_stock: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_adjust_stock_guards_negative() {
        let store = MemoryStore::new();
        store.insert_product(product("p1", 2));

        let err = store.adjust_stock("p1", -5).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 5,
                available: 2,
                ..
            }
        ));
        assert_eq!(store.stock_of("p1"), Some(2));

        assert_eq!(store.adjust_stock("p1", -2).await.unwrap(), 0);
        assert_eq!(store.adjust_stock("p1", 7).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_adjust_stock_missing_product() {
        let store = MemoryStore::new();
        let err = store.adjust_stock("ghost", 1).await.unwrap_err();
        assert!(matches!(err, CheckoutError::ProductNotFound { .. }));
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.insert_product(product("p1", 10));
        store.insert_product(product("p2", 1));

        let now = Utc::now();
        let sale = Sale {
            id: "s1".to_string(),
            line_count: 2,
            amount_cents: 2500,
            created_at: now,
            updated_at: now,
        };
        let lines = vec![
            SaleLine {
                id: "l1".to_string(),
                sale_id: "s1".to_string(),
                product_id: "p1".to_string(),
                quantity: 3,
            },
            SaleLine {
                id: "l2".to_string(),
                sale_id: "s1".to_string(),
                product_id: "p2".to_string(),
                quantity: 2, // only 1 available
            },
        ];

        let err = store.commit_checkout(&sale, &lines).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

        // First line's stock untouched, nothing persisted.
        assert_eq!(store.stock_of("p1"), Some(10));
        assert_eq!(store.stock_of("p2"), Some(1));
        assert_eq!(store.sale_count(), 0);
        assert_eq!(store.sale_line_count(), 0);
    }

    #[tokio::test]
    async fn test_movement_list_order_and_count() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for i in 0..3 {
            let m = StockMovement {
                id: format!("m{i}"),
                product_id: "p1".to_string(),
                quantity: 1,
                base_price_cents: 100,
                sell_price_cents: 200,
                received_at: now,
                note: None,
                created_at: now,
                updated_at: now,
            };
            store.insert(&m).await.unwrap();
        }

        let listed = store.list(10, 0).await.unwrap();
        assert_eq!(
            listed.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            vec!["m2", "m1", "m0"]
        );
        assert_eq!(store.count().await.unwrap(), 3);

        store.delete("m1").await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        assert!(matches!(
            store.delete("m1").await.unwrap_err(),
            CheckoutError::MovementNotFound { .. }
        ));
    }
}
