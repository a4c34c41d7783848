// stockroom/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::product::{Product, ProductId};

/// Server-assigned order identity (`orders.id`).
pub type OrderId = i64;

/// One `(product, quantity)` pair of an incoming order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
  #[serde(rename = "id")]
  pub product_id: ProductId,
  pub quantity: i64,
}

impl LineRequest {
  pub fn new(product_id: ProductId, quantity: i64) -> Self {
    Self { product_id, quantity }
  }
}

/// The `orders` row on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderHeader {
  pub id: OrderId,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A product as seen through an order: the product record plus the quantity
/// purchased in that order. Serialized flat, i.e. `{id, name, ..., quantity}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
  #[serde(flatten)]
  pub product: Product,
  pub quantity: i64,
}

impl OrderLine {
  pub fn product_id(&self) -> ProductId {
    self.product.id
  }
}

/// An order header together with every line it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
  pub id: OrderId,
  pub products: Vec<OrderLine>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn from_parts(header: OrderHeader, products: Vec<OrderLine>) -> Self {
    Self {
      id: header.id,
      products,
      created_at: header.created_at,
      updated_at: header.updated_at,
    }
  }

  /// `(product id, quantity)` for every line, in stored order.
  pub fn line_quantities(&self) -> Vec<(ProductId, i64)> {
    self.products.iter().map(|l| (l.product_id(), l.quantity)).collect()
  }
}

/// One row of the orders ⋈ order_products ⋈ products join. `line` is `None`
/// for an order header that owns no lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
  pub header: OrderHeader,
  pub line: Option<OrderLine>,
}
