// stockroom/src/store/memory.rs

//! In-process backend. Writers (transactions and product mutations) are
//! serialized by an async mutex and work on a private copy of the tables that
//! is swapped in on commit, so readers only ever observe committed state.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

use super::{OrderStore, ProductStore, StockTransaction};
use crate::error::{StockroomError, StockroomResult};
use crate::model::{OrderHeader, OrderId, OrderLine, OrderRow, Product, ProductId, ProductInput};

#[derive(Debug, Clone)]
struct LineRecord {
  order_id: OrderId,
  product_id: ProductId,
  quantity: i64,
}

#[derive(Debug, Clone)]
struct Tables {
  products: BTreeMap<ProductId, Product>,
  orders: BTreeMap<OrderId, OrderHeader>,
  lines: Vec<LineRecord>,
  next_product_id: ProductId,
  next_order_id: OrderId,
}

impl Default for Tables {
  fn default() -> Self {
    Self {
      products: BTreeMap::new(),
      orders: BTreeMap::new(),
      lines: Vec::new(),
      next_product_id: 1,
      next_order_id: 1,
    }
  }
}

impl Tables {
  fn lines_of(&self, order_id: OrderId) -> StockroomResult<Vec<OrderLine>> {
    self
      .lines
      .iter()
      .filter(|l| l.order_id == order_id)
      .map(|l| self.join_line(l))
      .collect()
  }

  fn join_line(&self, line: &LineRecord) -> StockroomResult<OrderLine> {
    // Product deletion is refused while lines reference it, so a dangling
    // line means the tables were corrupted.
    let product = self.products.get(&line.product_id).cloned().ok_or_else(|| {
      StockroomError::Internal(format!(
        "order {} references missing product {}",
        line.order_id, line.product_id
      ))
    })?;
    Ok(OrderLine {
      product,
      quantity: line.quantity,
    })
  }
}

/// `ProductStore` + `OrderStore` kept entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
  committed: Arc<RwLock<Tables>>,
  writer: Arc<Mutex<()>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Waits for exclusive write access and returns it with a working copy of
  /// the committed tables.
  async fn write_access(&self) -> (OwnedMutexGuard<()>, Tables) {
    let guard = self.writer.clone().lock_owned().await;
    // The read guard is released at the end of this statement, before any await.
    let working = self.committed.read().clone();
    (guard, working)
  }

  fn publish(&self, tables: Tables) {
    *self.committed.write() = tables;
  }
}

#[async_trait]
impl ProductStore for MemoryStore {
  async fn list_products(&self) -> StockroomResult<Vec<Product>> {
    Ok(self.committed.read().products.values().cloned().collect())
  }

  async fn create_product(&self, input: &ProductInput, at: DateTime<Utc>) -> StockroomResult<Product> {
    let (_guard, mut tables) = self.write_access().await;
    let product = Product {
      id: tables.next_product_id,
      name: input.name.clone(),
      price: input.price,
      stock: input.stock,
      sold: 0,
      created_at: at,
      updated_at: at,
    };
    tables.next_product_id += 1;
    tables.products.insert(product.id, product.clone());
    self.publish(tables);
    Ok(product)
  }

  async fn product(&self, id: ProductId) -> StockroomResult<Option<Product>> {
    Ok(self.committed.read().products.get(&id).cloned())
  }

  async fn update_product(
    &self,
    id: ProductId,
    input: &ProductInput,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>> {
    let (_guard, mut tables) = self.write_access().await;
    let updated = match tables.products.get_mut(&id) {
      Some(product) => {
        product.name = input.name.clone();
        product.price = input.price;
        product.stock = input.stock;
        product.updated_at = at;
        product.clone()
      }
      None => return Ok(None),
    };
    self.publish(tables);
    Ok(Some(updated))
  }

  async fn delete_product(&self, id: ProductId) -> StockroomResult<Option<Product>> {
    let (_guard, mut tables) = self.write_access().await;
    if !tables.products.contains_key(&id) {
      return Ok(None);
    }
    if tables.lines.iter().any(|l| l.product_id == id) {
      return Err(StockroomError::ProductInUse { product_id: id });
    }
    let removed = tables.products.remove(&id);
    self.publish(tables);
    Ok(removed)
  }
}

#[async_trait]
impl OrderStore for MemoryStore {
  async fn begin(&self) -> StockroomResult<Box<dyn StockTransaction>> {
    let (guard, working) = self.write_access().await;
    trace!("Memory transaction opened.");
    Ok(Box::new(MemoryTransaction {
      _writer: guard,
      working,
      committed: self.committed.clone(),
    }))
  }

  async fn order_rows(&self) -> StockroomResult<Vec<OrderRow>> {
    let tables = self.committed.read();
    let mut rows = Vec::new();
    for header in tables.orders.values() {
      let lines = tables.lines_of(header.id)?;
      if lines.is_empty() {
        rows.push(OrderRow {
          header: header.clone(),
          line: None,
        });
      }
      for line in lines {
        rows.push(OrderRow {
          header: header.clone(),
          line: Some(line),
        });
      }
    }
    Ok(rows)
  }

  async fn order_header(&self, id: OrderId) -> StockroomResult<Option<OrderHeader>> {
    Ok(self.committed.read().orders.get(&id).cloned())
  }

  async fn order_lines(&self, id: OrderId) -> StockroomResult<Vec<OrderLine>> {
    self.committed.read().lines_of(id)
  }
}

/// Holds the writer lock for its whole lifetime; dropping it uncommitted
/// simply throws the working copy away.
pub struct MemoryTransaction {
  _writer: OwnedMutexGuard<()>,
  working: Tables,
  committed: Arc<RwLock<Tables>>,
}

#[async_trait]
impl StockTransaction for MemoryTransaction {
  async fn lock_products(&mut self, ids: &[ProductId]) -> StockroomResult<Vec<Product>> {
    // The writer lock already excludes every other writer.
    let mut found: Vec<Product> = ids
      .iter()
      .filter_map(|id| self.working.products.get(id).cloned())
      .collect();
    found.sort_by_key(|p| p.id);
    found.dedup_by_key(|p| p.id);
    Ok(found)
  }

  async fn take_stock(
    &mut self,
    id: ProductId,
    quantity: i64,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>> {
    match self.working.products.get_mut(&id) {
      Some(product) if product.stock >= quantity => {
        let sold = product.sold.checked_add(quantity).ok_or_else(|| {
          StockroomError::Internal(format!("sold counter of product {} would overflow", id))
        })?;
        product.stock -= quantity;
        product.sold = sold;
        product.updated_at = at;
        Ok(Some(product.clone()))
      }
      _ => Ok(None),
    }
  }

  async fn insert_order(&mut self, at: DateTime<Utc>) -> StockroomResult<OrderHeader> {
    let header = OrderHeader {
      id: self.working.next_order_id,
      created_at: at,
      updated_at: at,
    };
    self.working.next_order_id += 1;
    self.working.orders.insert(header.id, header.clone());
    Ok(header)
  }

  async fn insert_line(
    &mut self,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    _at: DateTime<Utc>,
  ) -> StockroomResult<()> {
    if !self.working.orders.contains_key(&order_id) {
      return Err(StockroomError::Internal(format!("order {} does not exist", order_id)));
    }
    if !self.working.products.contains_key(&product_id) {
      return Err(StockroomError::Internal(format!("product {} does not exist", product_id)));
    }
    self.working.lines.push(LineRecord {
      order_id,
      product_id,
      quantity,
    });
    Ok(())
  }

  async fn lock_order(&mut self, id: OrderId) -> StockroomResult<Option<OrderHeader>> {
    Ok(self.working.orders.get(&id).cloned())
  }

  async fn order_lines(&mut self, id: OrderId) -> StockroomResult<Vec<OrderLine>> {
    self.working.lines_of(id)
  }

  async fn delete_order(&mut self, id: OrderId) -> StockroomResult<()> {
    let before = self.working.lines.len();
    self.working.lines.retain(|l| l.order_id != id);
    self.working.orders.remove(&id);
    debug!(order_id = id, lines = before - self.working.lines.len(), "Deleted order rows.");
    Ok(())
  }

  async fn commit(self: Box<Self>) -> StockroomResult<()> {
    let MemoryTransaction {
      _writer,
      working,
      committed,
    } = *self;
    *committed.write() = working;
    trace!("Memory transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StockroomResult<()> {
    trace!("Memory transaction rolled back.");
    Ok(())
  }
}
