//! # Stock Movement Repository
//!
//! Replenishment records. Pure record storage: the product stock increment
//! happens through the guarded delta in the product repository, driven by
//! the Stock Adjuster. Deleting a record here never touches product rows.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{CheckoutError, StockMovement, StockMovementStore};

const SELECT_COLUMNS: &str = r#"
    SELECT id, product_id, quantity, base_price_cents, sell_price_cents,
           received_at, note, created_at, updated_at
    FROM stock_movements
"#;

/// Repository for stock movement database operations.
#[derive(Debug, Clone)]
pub struct StockMovementRepository {
    pool: SqlitePool,
}

impl StockMovementRepository {
    /// Creates a new StockMovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockMovementRepository { pool }
    }

    async fn insert_row(&self, movement: &StockMovement) -> DbResult<()> {
        debug!(id = %movement.id, product_id = %movement.product_id, "inserting stock movement");

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, quantity, base_price_cents, sell_price_cents,
                received_at, note, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.quantity)
        .bind(movement.base_price_cents)
        .bind(movement.sell_price_cents)
        .bind(movement.received_at)
        .bind(&movement.note)
        .bind(movement.created_at)
        .bind(movement.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_row(&self, movement: &StockMovement) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stock_movements SET
                product_id = ?2,
                quantity = ?3,
                base_price_cents = ?4,
                sell_price_cents = ?5,
                received_at = ?6,
                note = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.quantity)
        .bind(movement.base_price_cents)
        .bind(movement.sell_price_cents)
        .bind(movement.received_at)
        .bind(&movement.note)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockMovement", &movement.id));
        }

        Ok(())
    }

    async fn delete_row(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stock_movements WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockMovement", id));
        }

        Ok(())
    }
}

/// Maps a storage-level NotFound onto the closed taxonomy; everything else
/// collapses into `Persistence`.
fn map_movement_err(err: DbError, id: &str) -> CheckoutError {
    match err {
        DbError::NotFound { .. } => CheckoutError::MovementNotFound {
            movement_id: id.to_string(),
        },
        other => other.into(),
    }
}

#[async_trait]
impl StockMovementStore for StockMovementRepository {
    async fn insert(&self, movement: &StockMovement) -> Result<(), CheckoutError> {
        self.insert_row(movement).await.map_err(Into::into)
    }

    async fn get(&self, id: &str) -> Result<Option<StockMovement>, CheckoutError> {
        let movement =
            sqlx::query_as::<_, StockMovement>(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        Ok(movement)
    }

    async fn update(&self, movement: &StockMovement) -> Result<(), CheckoutError> {
        self.update_row(movement)
            .await
            .map_err(|e| map_movement_err(e, &movement.id))
    }

    async fn delete(&self, id: &str) -> Result<(), CheckoutError> {
        debug!(id = %id, "deleting stock movement");
        self.delete_row(id).await.map_err(|e| map_movement_err(e, id))
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<StockMovement>, CheckoutError> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "{SELECT_COLUMNS} ORDER BY received_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        Ok(movements)
    }

    async fn for_product(&self, product_id: &str) -> Result<Vec<StockMovement>, CheckoutError> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "{SELECT_COLUMNS} WHERE product_id = ?1 ORDER BY received_at DESC, rowid DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        Ok(movements)
    }

    async fn count(&self) -> Result<i64, CheckoutError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_movements")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CheckoutError::from(DbError::from(e)))?;

        Ok(count)
    }
}
