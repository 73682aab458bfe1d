//! # Repository Module
//!
//! SQLite repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderProcessor / StockAdjuster (tally-core)                            │
//! │       │                                                                 │
//! │       │  dyn ProductStore / SaleStore / StockMovementStore              │
//! │       ▼                                                                 │
//! │  ProductRepository ── SaleRepository ── StockMovementRepository         │
//! │       │                    │                                            │
//! │       │   guarded UPDATE   │   one sqlx transaction per checkout        │
//! │       ▼                    ▼                                            │
//! │                   SQLite Database                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                         │
//! │  • The core is tested against an in-memory double of the same traits    │
//! │  • Stock mutations share a single conditional-update primitive          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Catalog reads and guarded stock deltas
//! - [`sale::SaleRepository`] - Atomic checkout commit and sale loading
//! - [`stock::StockMovementRepository`] - Replenishment records

pub mod product;
pub mod sale;
pub mod stock;
