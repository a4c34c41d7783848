// stockroom/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::model::{OrderId, ProductId};

#[derive(Debug, Error)]
pub enum StockroomError {
  /// Malformed input the caller can fix (empty order, non-positive quantity, ...).
  #[error("Invalid request: {0}")]
  Validation(String),

  #[error("Product not found: {product_id}")]
  ProductNotFound { product_id: ProductId },

  #[error("Order not found: {order_id}")]
  OrderNotFound { order_id: OrderId },

  #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
  InsufficientStock {
    product_id: ProductId,
    requested: i64,
    available: i64,
  },

  #[error("Product {product_id} is referenced by existing orders")]
  ProductInUse { product_id: ProductId },

  #[error("Operation '{operation}' did not finish before its deadline")]
  Timeout { operation: &'static str },

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Store backend error. Source: {source}")]
  Backend {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal stockroom error: {0}")]
  Internal(String),
}

impl StockroomError {
  /// True for persistence and connectivity failures, which callers must not
  /// describe to clients in any detail.
  pub fn is_internal(&self) -> bool {
    matches!(
      self,
      StockroomError::Database(_) | StockroomError::Backend { .. } | StockroomError::Internal(_)
    )
  }
}

impl From<AnyhowError> for StockroomError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a StockroomError that was boxed into anyhow somewhere down the stack.
    match err.downcast::<StockroomError>() {
      Ok(inner) => inner,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(db_err) => StockroomError::Database(db_err),
        Err(err) => StockroomError::Backend { source: err },
      },
    }
  }
}

pub type StockroomResult<T, E = StockroomError> = std::result::Result<T, E>;
