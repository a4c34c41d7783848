// stockroom/src/store/mod.rs

//! Persistence seam. The order logic only talks to these traits; `PgStore` is
//! the production backend, `MemoryStore` an in-process one with the same
//! transactional behavior.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StockroomResult;
use crate::model::{OrderHeader, OrderId, OrderLine, OrderRow, Product, ProductId, ProductInput};

/// CRUD over the `products` table.
///
/// Lookups return `Ok(None)` for an unknown id; absence is never encoded as a
/// zero-valued record. No field validation happens at this layer.
#[async_trait]
pub trait ProductStore: Send + Sync {
  async fn list_products(&self) -> StockroomResult<Vec<Product>>;

  /// Inserts with `sold = 0` and both timestamps set to `at`.
  async fn create_product(&self, input: &ProductInput, at: DateTime<Utc>) -> StockroomResult<Product>;

  async fn product(&self, id: ProductId) -> StockroomResult<Option<Product>>;

  /// Rewrites name, price and stock and refreshes `updated_at`. Leaves `sold` alone.
  async fn update_product(
    &self,
    id: ProductId,
    input: &ProductInput,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>>;

  /// Removes the product and returns the record as it was before deletion.
  /// Fails with `ProductInUse` while any order line references it.
  async fn delete_product(&self, id: ProductId) -> StockroomResult<Option<Product>>;
}

/// Read access to orders plus the entry point for order-mutating transactions.
#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Opens a transaction. Dropping it without `commit` discards every change.
  async fn begin(&self) -> StockroomResult<Box<dyn StockTransaction>>;

  /// Every order joined with its lines, ascending by order id. Lines of one
  /// order come in whatever order the backend yields them.
  async fn order_rows(&self) -> StockroomResult<Vec<OrderRow>>;

  async fn order_header(&self, id: OrderId) -> StockroomResult<Option<OrderHeader>>;

  async fn order_lines(&self, id: OrderId) -> StockroomResult<Vec<OrderLine>>;
}

/// One all-or-nothing unit of work over products and orders.
#[async_trait]
pub trait StockTransaction: Send {
  /// Locks the given product rows until the transaction ends and returns the
  /// ones that exist. Locks are taken in ascending id order.
  async fn lock_products(&mut self, ids: &[ProductId]) -> StockroomResult<Vec<Product>>;

  /// Moves `quantity` units from `stock` to `sold`. Returns `None` (and changes
  /// nothing) if the product is missing or holds fewer than `quantity` units.
  async fn take_stock(
    &mut self,
    id: ProductId,
    quantity: i64,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>>;

  async fn insert_order(&mut self, at: DateTime<Utc>) -> StockroomResult<OrderHeader>;

  async fn insert_line(
    &mut self,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    at: DateTime<Utc>,
  ) -> StockroomResult<()>;

  /// Locks the order header for deletion.
  async fn lock_order(&mut self, id: OrderId) -> StockroomResult<Option<OrderHeader>>;

  async fn order_lines(&mut self, id: OrderId) -> StockroomResult<Vec<OrderLine>>;

  /// Deletes the order's lines, then its header.
  async fn delete_order(&mut self, id: OrderId) -> StockroomResult<()>;

  async fn commit(self: Box<Self>) -> StockroomResult<()>;

  async fn rollback(self: Box<Self>) -> StockroomResult<()>;
}

/// Everything the service layer needs from a backend.
pub trait Store: ProductStore + OrderStore {}

impl<T: ProductStore + OrderStore> Store for T {}
