//! # Sale Repository
//!
//! The atomic checkout commit and sale loading.
//!
//! ## Commit Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       commit_checkout                                   │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    for each line:                                                       │
//! │      guarded decrement (stock = stock − qty WHERE stock − qty >= 0)     │
//! │      └── refused? → classify, ROLLBACK, surface typed error             │
//! │    INSERT sale row                                                      │
//! │    INSERT one sale_lines row per cart line                              │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Everything inside one sqlx transaction: a storage fault or a lost      │
//! │  stock race rolls back every decrement and every row. No partial sale   │
//! │  is ever observable.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::repository::product::{apply_stock_delta, classify_refusal, StockDelta};
use tally_core::{CheckoutError, Sale, SaleLine, SaleStore};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Counts committed sales (for diagnostics).
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn commit_checkout(&self, sale: &Sale, lines: &[SaleLine]) -> Result<(), CheckoutError> {
        debug!(sale_id = %sale.id, lines = lines.len(), "committing checkout");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        // Guarded decrements first: the authoritative stock check. The
        // validation-phase read in the processor is advisory only.
        for line in lines {
            let outcome = apply_stock_delta(&mut tx, &line.product_id, -line.quantity)
                .await
                .map_err(CheckoutError::from)?;

            if !matches!(outcome, StockDelta::Applied(_)) {
                let err = classify_refusal(&line.product_id, -line.quantity, outcome);
                warn!(sale_id = %sale.id, product_id = %line.product_id, error = %err, "checkout rolled back");
                // Dropping the transaction rolls back every decrement.
                return Err(err);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO sales (id, line_count, amount_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.line_count)
        .bind(sale.amount_cents)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (id, sale_id, product_id, quantity)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(&line.id)
            .bind(&line.sale_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckoutError::from(DbError::from(e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        debug!(sale_id = %sale.id, "checkout committed");
        Ok(())
    }

    async fn get_with_lines(
        &self,
        id: &str,
    ) -> Result<Option<(Sale, Vec<SaleLine>)>, CheckoutError> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, line_count, amount_cents, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT id, sale_id, product_id, quantity
            FROM sale_lines
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        Ok(Some((sale, lines)))
    }
}
