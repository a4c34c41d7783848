// stockroom/src/orders/mod.rs

//! Order placement (transactional stock movement) and order aggregation.

pub mod aggregate;
pub mod transaction;

pub use aggregate::{get_order, group_rows, list_orders};
pub use transaction::{delete_order, place_order, validate_request};
