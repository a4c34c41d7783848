// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockroom::{
  MemoryStore, OrderHeader, OrderId, OrderLine, OrderRow, OrderStore, Product, ProductId, ProductInput,
  ProductStore, StockTransaction, Stockroom, StockroomError, StockroomResult,
};
use tracing::Level;

// --- Helper for Tracing Setup ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Several test binaries may race to install it
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---

/// A stockroom over a fresh memory store holding one product per `(name, price, stock)`.
pub async fn seeded(items: &[(&str, i64, i64)]) -> (Stockroom, Vec<Product>) {
  seeded_with(Stockroom::in_memory(), items).await
}

pub async fn seeded_with(room: Stockroom, items: &[(&str, i64, i64)]) -> (Stockroom, Vec<Product>) {
  let mut products = Vec::new();
  for (name, price, stock) in items {
    let product = room
      .create_product(&ProductInput::new(*name, *price, *stock))
      .await
      .expect("seeding a product");
    products.push(product);
  }
  (room, products)
}

/// `(stock, sold)` of a product as currently committed.
pub async fn counters(room: &Stockroom, id: ProductId) -> (i64, i64) {
  let p = room.product(id).await.expect("product exists");
  (p.stock, p.sold)
}

pub fn sorted_quantities(mut pairs: Vec<(ProductId, i64)>) -> Vec<(ProductId, i64)> {
  pairs.sort_unstable();
  pairs
}

// --- Fault injection ---

/// Where a `FaultyStore` transaction misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
  /// `insert_order` fails.
  InsertOrder,
  /// The n-th (0-based) `insert_line` of a transaction fails.
  InsertLine(usize),
  /// `commit` fails without publishing anything.
  Commit,
  /// `insert_order` sleeps this long before doing its work.
  StallBeforeInsertOrder(Duration),
  /// A concurrent writer deletes the order right after its header was read.
  DeleteOrderAfterHeaderRead,
}

/// Delegates to a `MemoryStore` and injects one fault into every transaction.
#[derive(Clone)]
pub struct FaultyStore {
  inner: MemoryStore,
  fault: Fault,
}

impl FaultyStore {
  pub fn new(fault: Fault) -> Self {
    Self {
      inner: MemoryStore::new(),
      fault,
    }
  }

  pub fn stockroom(fault: Fault) -> Stockroom {
    Stockroom::new(Arc::new(Self::new(fault)))
  }
}

fn injected(what: &str) -> StockroomError {
  StockroomError::from(anyhow::anyhow!("injected failure: {}", what))
}

#[async_trait]
impl ProductStore for FaultyStore {
  async fn list_products(&self) -> StockroomResult<Vec<Product>> {
    self.inner.list_products().await
  }

  async fn create_product(&self, input: &ProductInput, at: DateTime<Utc>) -> StockroomResult<Product> {
    self.inner.create_product(input, at).await
  }

  async fn product(&self, id: ProductId) -> StockroomResult<Option<Product>> {
    self.inner.product(id).await
  }

  async fn update_product(
    &self,
    id: ProductId,
    input: &ProductInput,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>> {
    self.inner.update_product(id, input, at).await
  }

  async fn delete_product(&self, id: ProductId) -> StockroomResult<Option<Product>> {
    self.inner.delete_product(id).await
  }
}

#[async_trait]
impl OrderStore for FaultyStore {
  async fn begin(&self) -> StockroomResult<Box<dyn StockTransaction>> {
    let inner = self.inner.begin().await?;
    Ok(Box::new(FaultyTransaction {
      inner,
      fault: self.fault,
      lines_inserted: 0,
    }))
  }

  async fn order_rows(&self) -> StockroomResult<Vec<OrderRow>> {
    self.inner.order_rows().await
  }

  async fn order_header(&self, id: OrderId) -> StockroomResult<Option<OrderHeader>> {
    let header = self.inner.order_header(id).await?;
    if self.fault == Fault::DeleteOrderAfterHeaderRead {
      let mut tx = self.inner.begin().await?;
      tx.delete_order(id).await?;
      tx.commit().await?;
    }
    Ok(header)
  }

  async fn order_lines(&self, id: OrderId) -> StockroomResult<Vec<OrderLine>> {
    OrderStore::order_lines(&self.inner, id).await
  }
}

struct FaultyTransaction {
  inner: Box<dyn StockTransaction>,
  fault: Fault,
  lines_inserted: usize,
}

#[async_trait]
impl StockTransaction for FaultyTransaction {
  async fn lock_products(&mut self, ids: &[ProductId]) -> StockroomResult<Vec<Product>> {
    self.inner.lock_products(ids).await
  }

  async fn take_stock(
    &mut self,
    id: ProductId,
    quantity: i64,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>> {
    self.inner.take_stock(id, quantity, at).await
  }

  async fn insert_order(&mut self, at: DateTime<Utc>) -> StockroomResult<OrderHeader> {
    match self.fault {
      Fault::InsertOrder => return Err(injected("insert_order")),
      Fault::StallBeforeInsertOrder(pause) => tokio::time::sleep(pause).await,
      _ => {}
    }
    self.inner.insert_order(at).await
  }

  async fn insert_line(
    &mut self,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    at: DateTime<Utc>,
  ) -> StockroomResult<()> {
    if self.fault == Fault::InsertLine(self.lines_inserted) {
      return Err(injected("insert_line"));
    }
    self.lines_inserted += 1;
    self.inner.insert_line(order_id, product_id, quantity, at).await
  }

  async fn lock_order(&mut self, id: OrderId) -> StockroomResult<Option<OrderHeader>> {
    self.inner.lock_order(id).await
  }

  async fn order_lines(&mut self, id: OrderId) -> StockroomResult<Vec<OrderLine>> {
    self.inner.order_lines(id).await
  }

  async fn delete_order(&mut self, id: OrderId) -> StockroomResult<()> {
    self.inner.delete_order(id).await
  }

  async fn commit(self: Box<Self>) -> StockroomResult<()> {
    if self.fault == Fault::Commit {
      // Dropping the inner transaction discards its working copy.
      return Err(injected("commit"));
    }
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> StockroomResult<()> {
    self.inner.rollback().await
  }
}
