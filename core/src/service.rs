// stockroom/src/service.rs

//! `Stockroom`: the single entry point used by the web layer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::catalog;
use crate::error::{StockroomError, StockroomResult};
use crate::model::{LineRequest, Order, OrderId, Product, ProductId, ProductInput};
use crate::orders;
use crate::store::{MemoryStore, Store};

/// Cheap to clone; every clone shares the same store.
///
/// Each operation runs under a deadline. When it expires the in-flight future
/// is dropped, which rolls back any open transaction and returns its
/// connection to the pool, and the caller gets `StockroomError::Timeout`.
#[derive(Clone)]
pub struct Stockroom {
  store: Arc<dyn Store>,
  deadline: Duration,
}

impl Stockroom {
  pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

  pub fn new(store: Arc<dyn Store>) -> Self {
    Self {
      store,
      deadline: Self::DEFAULT_DEADLINE,
    }
  }

  /// Backed by a fresh `MemoryStore`.
  pub fn in_memory() -> Self {
    Self::new(Arc::new(MemoryStore::new()))
  }

  pub fn with_deadline(mut self, deadline: Duration) -> Self {
    self.deadline = deadline;
    self
  }

  pub fn deadline(&self) -> Duration {
    self.deadline
  }

  pub fn store(&self) -> &Arc<dyn Store> {
    &self.store
  }

  async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> StockroomResult<T>
  where
    F: Future<Output = StockroomResult<T>>,
  {
    match tokio::time::timeout(self.deadline, fut).await {
      Ok(result) => result,
      Err(_) => {
        warn!(operation, deadline_ms = self.deadline.as_millis() as u64, "Operation timed out.");
        Err(StockroomError::Timeout { operation })
      }
    }
  }

  // --- Products ---

  pub async fn list_products(&self) -> StockroomResult<Vec<Product>> {
    self
      .bounded("list_products", catalog::list_products(self.store.as_ref()))
      .await
  }

  pub async fn create_product(&self, input: &ProductInput) -> StockroomResult<Product> {
    self
      .bounded("create_product", catalog::create_product(self.store.as_ref(), input))
      .await
  }

  pub async fn product(&self, id: ProductId) -> StockroomResult<Product> {
    self.bounded("get_product", catalog::product(self.store.as_ref(), id)).await
  }

  pub async fn update_product(&self, id: ProductId, input: &ProductInput) -> StockroomResult<Product> {
    self
      .bounded("update_product", catalog::update_product(self.store.as_ref(), id, input))
      .await
  }

  pub async fn delete_product(&self, id: ProductId) -> StockroomResult<Product> {
    self
      .bounded("delete_product", catalog::delete_product(self.store.as_ref(), id))
      .await
  }

  // --- Orders ---

  pub async fn list_orders(&self) -> StockroomResult<Vec<Order>> {
    self.bounded("list_orders", orders::list_orders(self.store.as_ref())).await
  }

  pub async fn create_order(&self, lines: &[LineRequest]) -> StockroomResult<Order> {
    self
      .bounded("create_order", orders::place_order(self.store.as_ref(), lines))
      .await
  }

  pub async fn order(&self, id: OrderId) -> StockroomResult<Order> {
    self.bounded("get_order", orders::get_order(self.store.as_ref(), id)).await
  }

  pub async fn delete_order(&self, id: OrderId) -> StockroomResult<Order> {
    self
      .bounded("delete_order", orders::delete_order(self.store.as_ref(), id))
      .await
  }
}
