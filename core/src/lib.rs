// stockroom/src/lib.rs

//! Stockroom: products, stock and orders.
//!
//! The interesting part is order placement: every requested product row is
//! locked, stock is checked and moved line by line in the submitted order,
//! and the order header plus its lines are written, all inside one store
//! transaction. Any failure leaves no trace. Orders are read back by
//! aggregating the orders ⋈ order_products ⋈ products join.
//!
//!  - `model`: products, orders, order lines and join rows.
//!  - `store`: the persistence traits plus the PostgreSQL and in-memory backends.
//!  - `catalog`: product CRUD.
//!  - `orders`: order placement/removal and aggregation.
//!  - `service`: the `Stockroom` facade that applies per-operation deadlines.

pub mod catalog;
pub mod error;
pub mod model;
pub mod orders;
pub mod service;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::error::{StockroomError, StockroomResult};
pub use crate::model::{LineRequest, Order, OrderHeader, OrderId, OrderLine, OrderRow, Product, ProductId, ProductInput};
pub use crate::service::Stockroom;
pub use crate::store::{MemoryStore, OrderStore, PgStore, ProductStore, StockTransaction, Store};
