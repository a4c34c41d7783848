// stockroom/src/model/mod.rs

//! Records exchanged between the stores, the order logic and the web layer.

pub mod order;
pub mod product;

pub use order::{LineRequest, Order, OrderHeader, OrderId, OrderLine, OrderRow};
pub use product::{Product, ProductId, ProductInput};
