//! # Product Repository
//!
//! Catalog reads and the guarded stock-delta primitive.
//!
//! ## The Guarded Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ UNSAFE: read-then-write in two steps                               │
//! │     SELECT stock FROM products WHERE id = ?   -- stock = 1             │
//! │     UPDATE products SET stock = 0 WHERE id = ? -- both racers do this  │
//! │     Two concurrent checkouts both see stock=1 and both "succeed":      │
//! │     one unit sold twice.                                               │
//! │                                                                         │
//! │  ✅ SAFE: conditional delta, atomic with the read                      │
//! │     UPDATE products SET stock = stock + :delta                         │
//! │     WHERE id = :id AND stock + :delta >= 0                             │
//! │     RETURNING stock                                                    │
//! │                                                                         │
//! │  Zero rows back means the guard refused: the row is re-read to tell    │
//! │  "product gone" from "not enough stock" from "lost a race".            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkout decrements ([`super::sale::SaleRepository`]) and replenishment
//! increments both go through [`apply_stock_delta`], so every mutation of a
//! product's stock serializes on the same statement.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{CheckoutError, Product, ProductStore};

/// Outcome of a guarded stock delta.
#[derive(Debug, Clone, Copy)]
pub(crate) enum StockDelta {
    /// Delta applied; carries the new stock level.
    Applied(i64),
    /// No such product row.
    Missing,
    /// Guard refused: applying the delta would drive stock negative.
    /// Carries the stock observed immediately after the refusal.
    Insufficient { available: i64 },
}

/// Applies `delta` to a product's stock, atomically with the
/// non-negativity check.
///
/// Runs on a plain connection or inside a transaction; the caller owns the
/// transactional scope. When the guard refuses, the row is re-read on the
/// same connection to classify the refusal.
pub(crate) async fn apply_stock_delta(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
) -> DbResult<StockDelta> {
    let now = Utc::now();

    let new_stock: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET stock = stock + ?2, updated_at = ?3
        WHERE id = ?1 AND stock + ?2 >= 0
        RETURNING stock
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(stock) = new_stock {
        return Ok(StockDelta::Applied(stock));
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(match available {
        None => StockDelta::Missing,
        Some(available) => StockDelta::Insufficient { available },
    })
}

/// Classifies a refused delta into the checkout taxonomy.
///
/// A decrement refused by the guard while the re-read shows enough stock
/// means another writer slipped in between the two statements - that is a
/// retryable [`CheckoutError::Conflict`]. (Inside a transaction the re-read
/// is consistent with the guard, so that arm is unreachable there.)
pub(crate) fn classify_refusal(id: &str, delta: i64, outcome: StockDelta) -> CheckoutError {
    match outcome {
        StockDelta::Applied(_) => unreachable!("refusal classification on applied delta"),
        StockDelta::Missing => CheckoutError::ProductNotFound {
            product_id: id.to_string(),
        },
        StockDelta::Insufficient { available } => {
            let requested = delta.abs();
            if available >= requested {
                CheckoutError::Conflict {
                    product_id: id.to_string(),
                }
            } else {
                CheckoutError::InsufficientStock {
                    product_id: id.to_string(),
                    requested,
                    available,
                }
            }
        }
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// This is the catalog collaborator's write path (seeding, tests); the
    /// checkout core itself never creates products.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, sell_price_cents, base_price_cents,
                stock, minimum_stock, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.sell_price_cents)
        .bind(product.base_price_cents)
        .bind(product.stock)
        .bind(product.minimum_stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, sell_price_cents, base_price_cents,
                   stock, minimum_stock, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products sorted by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, sell_price_cents, base_price_cents,
                   stock, minimum_stock, created_at, updated_at
            FROM products
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn get(&self, id: &str) -> Result<Option<Product>, CheckoutError> {
        self.get_by_id(id).await.map_err(Into::into)
    }

    async fn adjust_stock(&self, id: &str, delta: i64) -> Result<i64, CheckoutError> {
        debug!(id = %id, delta = %delta, "adjusting stock");

        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let outcome = apply_stock_delta(&mut conn, id, delta).await?;

        match outcome {
            StockDelta::Applied(stock) => Ok(stock),
            refused => Err(classify_refusal(id, delta, refused)),
        }
    }
}
