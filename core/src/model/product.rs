// stockroom/src/model/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Server-assigned product identity (`products.id`).
pub type ProductId = i64;

/// A catalog entry. `stock` is what can still be sold, `sold` the running total
/// of units that left through orders. Prices are in the minor currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  pub price: i64,
  pub stock: i64,
  pub sold: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Writable product fields, used by both create and update. `sold` is never
/// caller-controlled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
  pub name: String,
  pub price: i64,
  pub stock: i64,
}

impl ProductInput {
  pub fn new(name: impl Into<String>, price: i64, stock: i64) -> Self {
    Self {
      name: name.into(),
      price,
      stock,
    }
  }
}
