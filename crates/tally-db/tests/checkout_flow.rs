//! End-to-end tests for the checkout and replenishment flows against a real
//! SQLite database (in-memory, migrated per test).

use chrono::Utc;
use std::sync::Arc;
use tally_core::{
    CartLine, CheckoutError, Money, OrderProcessor, Product, StockAdjuster, StockReceipt,
};
use tally_db::{Database, DbConfig};
use uuid::Uuid;

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database should open")
}

async fn insert_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> String {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        sell_price_cents: price_cents,
        base_price_cents: price_cents * 60 / 100,
        stock,
        minimum_stock: 2,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("insert product");
    product.id
}

fn processor(db: &Database) -> OrderProcessor {
    OrderProcessor::new(Arc::new(db.products()), Arc::new(db.sales()))
}

fn adjuster(db: &Database) -> StockAdjuster {
    StockAdjuster::new(Arc::new(db.products()), Arc::new(db.stock_movements()))
}

fn receipt(product_id: &str, quantity: i64) -> StockReceipt {
    StockReceipt {
        product_id: product_id.to_string(),
        quantity,
        base_price_cents: 120,
        sell_price_cents: 199,
        received_at: Utc::now(),
        note: None,
    }
}

async fn stock_of(db: &Database, id: &str) -> i64 {
    db.products()
        .get_by_id(id)
        .await
        .expect("read product")
        .expect("product exists")
        .stock
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_succeeds_and_returns_change() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 10).await;

    let outcome = processor(&db)
        .create_order(&[CartLine::new(&cola, 3)], Money::from_cents(10_00))
        .await
        .expect("checkout should succeed");

    assert_eq!(outcome.sale.amount_cents, 7_50);
    assert_eq!(outcome.change, Money::from_cents(2_50));
    assert_eq!(outcome.lines.len(), 1);
    assert_eq!(stock_of(&db, &cola).await, 7);
    assert_eq!(db.sales().count().await.expect("count sales"), 1);
}

#[tokio::test]
async fn checkout_refuses_insufficient_stock() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 2).await;

    let err = processor(&db)
        .create_order(&[CartLine::new(&cola, 3)], Money::from_cents(10_00))
        .await
        .expect_err("checkout should refuse");

    assert!(matches!(
        err,
        CheckoutError::InsufficientStock {
            requested: 3,
            available: 2,
            ..
        }
    ));
    assert_eq!(stock_of(&db, &cola).await, 2);
    assert_eq!(db.sales().count().await.expect("count sales"), 0);
}

#[tokio::test]
async fn checkout_refuses_insufficient_balance() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 10).await;

    let err = processor(&db)
        .create_order(&[CartLine::new(&cola, 3)], Money::from_cents(5_00))
        .await
        .expect_err("checkout should refuse");

    assert!(matches!(
        err,
        CheckoutError::InsufficientBalance {
            required_cents: 7_50,
            tendered_cents: 5_00,
        }
    ));
    // Balance is checked before any write.
    assert_eq!(stock_of(&db, &cola).await, 10);
}

#[tokio::test]
async fn failed_middle_line_rolls_back_every_decrement() {
    use tally_core::{Sale, SaleLine, SaleStore};

    let db = test_db().await;
    let a = insert_product(&db, "A", 1_00, 10).await;
    let b = insert_product(&db, "B", 1_00, 1).await;
    let c = insert_product(&db, "C", 1_00, 10).await;

    // Drive the store directly with a cart its advisory validation never
    // saw: the middle line exceeds stock, so the commit-phase guard refuses
    // after A's decrement already ran inside the transaction.
    let now = Utc::now();
    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        line_count: 3,
        amount_cents: 6_00,
        created_at: now,
        updated_at: now,
    };
    let lines: Vec<SaleLine> = [(&a, 2), (&b, 2), (&c, 2)]
        .into_iter()
        .map(|(product_id, quantity)| SaleLine {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            product_id: product_id.clone(),
            quantity,
        })
        .collect();

    let err = db
        .sales()
        .commit_checkout(&sale, &lines)
        .await
        .expect_err("commit should refuse");

    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
    // A's decrement inside the transaction was rolled back.
    assert_eq!(stock_of(&db, &a).await, 10);
    assert_eq!(stock_of(&db, &b).await, 1);
    assert_eq!(stock_of(&db, &c).await, 10);
    assert_eq!(db.sales().count().await.expect("count sales"), 0);
}

#[tokio::test]
async fn checkout_exact_stock_boundary() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 3).await;

    processor(&db)
        .create_order(&[CartLine::new(&cola, 3)], Money::from_cents(7_50)) // exact tender too
        .await
        .expect("exact stock and tender should succeed");

    assert_eq!(stock_of(&db, &cola).await, 0);
}

#[tokio::test]
async fn checkout_unknown_product() {
    let db = test_db().await;

    let err = processor(&db)
        .create_order(&[CartLine::new("no-such-id", 1)], Money::from_cents(1_00))
        .await
        .expect_err("checkout should refuse");

    assert!(matches!(err, CheckoutError::ProductNotFound { .. }));
}

#[tokio::test]
async fn get_order_resolves_lines_against_current_catalog() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 10).await;
    let chips = insert_product(&db, "Chips", 1_75, 10).await;

    let p = processor(&db);
    let outcome = p
        .create_order(
            &[CartLine::new(&cola, 2), CartLine::new(&chips, 1)],
            Money::from_cents(20_00),
        )
        .await
        .expect("checkout should succeed");

    let view = p.get_order(&outcome.sale.id).await.expect("load sale");
    assert_eq!(view.sale.id, outcome.sale.id);
    assert_eq!(view.sale.amount_cents, 6_75);
    assert_eq!(view.lines.len(), 2);
    assert_eq!(view.lines[0].product.id, cola);
    assert_eq!(view.lines[0].line.quantity, 2);
    // Current state: the checkout's own decrement is visible.
    assert_eq!(view.lines[0].product.stock, 8);
    assert_eq!(view.lines[1].product.id, chips);
}

#[tokio::test]
async fn get_order_unknown_sale() {
    let db = test_db().await;

    let err = processor(&db)
        .get_order("no-such-sale")
        .await
        .expect_err("lookup should refuse");

    assert!(matches!(err, CheckoutError::SaleNotFound { .. }));
}

// =============================================================================
// Replenishment
// =============================================================================

#[tokio::test]
async fn receive_stock_increments_and_records() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 4).await;

    let adjuster = adjuster(&db);
    let movement = adjuster
        .receive_stock(receipt(&cola, 6))
        .await
        .expect("receipt should succeed");

    assert_eq!(movement.quantity, 6);
    assert_eq!(stock_of(&db, &cola).await, 10);
    assert_eq!(adjuster.count_records().await.expect("count"), 1);

    let loaded = adjuster.get_record(&movement.id).await.expect("load record");
    assert_eq!(loaded.product_id, cola);
}

#[tokio::test]
async fn update_record_rewrites_without_touching_stock() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 4).await;

    let adjuster = adjuster(&db);
    let movement = adjuster
        .receive_stock(receipt(&cola, 6))
        .await
        .expect("receipt should succeed");

    let mut corrected = receipt(&cola, 8);
    corrected.note = Some("corrected quantity".to_string());
    let updated = adjuster
        .update_record(&movement.id, corrected)
        .await
        .expect("update should succeed");

    assert_eq!(updated.quantity, 8);
    assert_eq!(updated.note.as_deref(), Some("corrected quantity"));
    // Record mutation never touches the product row.
    assert_eq!(stock_of(&db, &cola).await, 10);
}

#[tokio::test]
async fn delete_record_keeps_stock_and_leaves_gap() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 0).await;

    let adjuster = adjuster(&db);
    let first = adjuster
        .receive_stock(receipt(&cola, 5))
        .await
        .expect("first receipt");
    let _second = adjuster
        .receive_stock(receipt(&cola, 5))
        .await
        .expect("second receipt");

    adjuster.delete_record(&first.id).await.expect("delete");

    assert_eq!(stock_of(&db, &cola).await, 10);
    assert_eq!(adjuster.count_records().await.expect("count"), 1);

    let err = adjuster
        .get_record(&first.id)
        .await
        .expect_err("record is gone");
    assert!(matches!(err, CheckoutError::MovementNotFound { .. }));

    let err = adjuster
        .delete_record(&first.id)
        .await
        .expect_err("second delete refuses");
    assert!(matches!(err, CheckoutError::MovementNotFound { .. }));
}

#[tokio::test]
async fn movement_listing_is_newest_first() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 2_50, 0).await;
    let chips = insert_product(&db, "Chips", 1_75, 0).await;

    let adjuster = adjuster(&db);
    let first = adjuster
        .receive_stock(receipt(&cola, 1))
        .await
        .expect("receipt");
    let second = adjuster
        .receive_stock(receipt(&chips, 2))
        .await
        .expect("receipt");
    let third = adjuster
        .receive_stock(receipt(&cola, 3))
        .await
        .expect("receipt");

    let all = adjuster.list_records(10, 0).await.expect("list");
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].id, third.id);
    assert_eq!(all[2].id, first.id);

    let page = adjuster.list_records(1, 1).await.expect("page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, second.id);

    let for_cola = adjuster.records_for_product(&cola).await.expect("filter");
    assert_eq!(for_cola.len(), 2);
    assert_eq!(for_cola[0].id, third.id);

    let none = adjuster
        .records_for_product("no-such-product")
        .await
        .expect("empty filter");
    assert!(none.is_empty());
}

// =============================================================================
// Concurrency & conservation
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checkouts_never_oversell() {
    // File-backed database: the in-memory config is single-connection, which
    // would serialize the race trivially.
    let dir = std::env::temp_dir().join(format!("tally-race-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("race.db");

    let db = Database::new(DbConfig::new(&path)).await.expect("open db");
    let cola = insert_product(&db, "Cola", 2_50, 5).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let p = processor(&db);
        let id = cola.clone();
        handles.push(tokio::spawn(async move {
            p.create_order(&[CartLine::new(&id, 2)], Money::from_cents(10_00))
                .await
        }));
    }

    let mut committed = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            Ok(_) => committed += 1,
            Err(
                CheckoutError::InsufficientStock { .. }
                | CheckoutError::Conflict { .. }
                | CheckoutError::Persistence(_),
            ) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    // 5 units, 2 per cart: at most 2 checkouts can commit, and stock must
    // account exactly for the committed ones.
    assert!(committed <= 2, "oversold: {committed} checkouts committed");
    assert_eq!(stock_of(&db, &cola).await, 5 - committed * 2);

    db.close().await;
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn stock_is_conserved_across_receipts_and_checkouts() {
    let db = test_db().await;
    let cola = insert_product(&db, "Cola", 1_00, 3).await;

    let adjuster = adjuster(&db);
    let p = processor(&db);

    adjuster.receive_stock(receipt(&cola, 7)).await.expect("receipt");
    p.create_order(&[CartLine::new(&cola, 4)], Money::from_cents(10_00))
        .await
        .expect("first checkout");
    adjuster.receive_stock(receipt(&cola, 2)).await.expect("receipt");
    p.create_order(&[CartLine::new(&cola, 5)], Money::from_cents(10_00))
        .await
        .expect("second checkout");

    // 3 + 7 - 4 + 2 - 5
    assert_eq!(stock_of(&db, &cola).await, 3);
}

// =============================================================================
// Infrastructure
// =============================================================================

#[tokio::test]
async fn migrations_and_health() {
    let db = test_db().await;

    assert!(db.health_check().await);

    let (total, applied) = tally_db::migrations::migration_status(db.pool())
        .await
        .expect("migration status");
    assert_eq!(total, applied);
    assert!(applied >= 1);
}
