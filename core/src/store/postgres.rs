// stockroom/src/store/postgres.rs

//! PostgreSQL backend. Queries are runtime-checked (`query_as` + `bind`), so the
//! crate builds without a live database.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgExecutor, PgPool};
use sqlx::{FromRow, Postgres, Transaction};
use tracing::{debug, instrument, warn};

use super::{OrderStore, ProductStore, StockTransaction};
use crate::error::{StockroomError, StockroomResult};
use crate::model::{OrderHeader, OrderId, OrderLine, OrderRow, Product, ProductId, ProductInput};

/// Idempotent DDL for the tables the queries below expect.
pub const SCHEMA: &str = include_str!("../../schema.sql");

/// `ProductStore` + `OrderStore` over a bounded `PgPool`.
///
/// Every call checks a connection out of the pool and hands it back when the
/// query (or the transaction) finishes, on success and on error alike.
#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
  statement_timeout: Option<Duration>,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self {
      pool,
      statement_timeout: None,
    }
  }

  /// Server-side `statement_timeout` applied inside every transaction this store opens.
  pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
    self.statement_timeout = Some(timeout);
    self
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

/// Product columns plus the per-order quantity.
#[derive(FromRow)]
struct LineRecord {
  id: ProductId,
  name: String,
  price: i64,
  stock: i64,
  sold: i64,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
  quantity: i64,
}

impl From<LineRecord> for OrderLine {
  fn from(r: LineRecord) -> Self {
    OrderLine {
      product: Product {
        id: r.id,
        name: r.name,
        price: r.price,
        stock: r.stock,
        sold: r.sold,
        created_at: r.created_at,
        updated_at: r.updated_at,
      },
      quantity: r.quantity,
    }
  }
}

/// Left-joined row: every product column is NULL for a header without lines.
#[derive(FromRow)]
struct JoinRecord {
  order_id: OrderId,
  order_created_at: DateTime<Utc>,
  order_updated_at: DateTime<Utc>,
  product_id: Option<ProductId>,
  name: Option<String>,
  price: Option<i64>,
  stock: Option<i64>,
  sold: Option<i64>,
  product_created_at: Option<DateTime<Utc>>,
  product_updated_at: Option<DateTime<Utc>>,
  quantity: Option<i64>,
}

impl From<JoinRecord> for OrderRow {
  fn from(r: JoinRecord) -> Self {
    let header = OrderHeader {
      id: r.order_id,
      created_at: r.order_created_at,
      updated_at: r.order_updated_at,
    };
    let line = match (
      r.product_id,
      r.name,
      r.price,
      r.stock,
      r.sold,
      r.product_created_at,
      r.product_updated_at,
      r.quantity,
    ) {
      (Some(id), Some(name), Some(price), Some(stock), Some(sold), Some(created_at), Some(updated_at), Some(quantity)) => {
        Some(OrderLine {
          product: Product {
            id,
            name,
            price,
            stock,
            sold,
            created_at,
            updated_at,
          },
          quantity,
        })
      }
      _ => None,
    };
    OrderRow { header, line }
  }
}

async fn fetch_order_lines<'e, E: PgExecutor<'e>>(executor: E, order_id: OrderId) -> StockroomResult<Vec<OrderLine>> {
  let records: Vec<LineRecord> = sqlx::query_as(
    "SELECT p.id, p.name, p.price, p.stock, p.sold, p.created_at, p.updated_at, op.quantity \
     FROM order_products op \
     JOIN products p ON p.id = op.product_id \
     WHERE op.order_id = $1 \
     ORDER BY op.product_id ASC",
  )
  .bind(order_id)
  .fetch_all(executor)
  .await?;
  Ok(records.into_iter().map(OrderLine::from).collect())
}

#[async_trait]
impl ProductStore for PgStore {
  #[instrument(name = "PgStore::list_products", skip(self), err(Display))]
  async fn list_products(&self) -> StockroomResult<Vec<Product>> {
    let products: Vec<Product> =
      sqlx::query_as("SELECT id, name, price, stock, sold, created_at, updated_at FROM products ORDER BY id ASC")
        .fetch_all(&self.pool)
        .await?;
    debug!(count = products.len(), "Fetched products.");
    Ok(products)
  }

  #[instrument(name = "PgStore::create_product", skip(self, input), fields(name = %input.name), err(Display))]
  async fn create_product(&self, input: &ProductInput, at: DateTime<Utc>) -> StockroomResult<Product> {
    let product: Product = sqlx::query_as(
      "INSERT INTO products (name, price, stock, sold, created_at, updated_at) \
       VALUES ($1, $2, $3, 0, $4, $4) \
       RETURNING id, name, price, stock, sold, created_at, updated_at",
    )
    .bind(&input.name)
    .bind(input.price)
    .bind(input.stock)
    .bind(at)
    .fetch_one(&self.pool)
    .await?;
    Ok(product)
  }

  #[instrument(name = "PgStore::product", skip(self), err(Display))]
  async fn product(&self, id: ProductId) -> StockroomResult<Option<Product>> {
    let product: Option<Product> =
      sqlx::query_as("SELECT id, name, price, stock, sold, created_at, updated_at FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(product)
  }

  #[instrument(name = "PgStore::update_product", skip(self, input), err(Display))]
  async fn update_product(
    &self,
    id: ProductId,
    input: &ProductInput,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>> {
    let product: Option<Product> = sqlx::query_as(
      "UPDATE products SET name = $1, price = $2, stock = $3, updated_at = $4 \
       WHERE id = $5 \
       RETURNING id, name, price, stock, sold, created_at, updated_at",
    )
    .bind(&input.name)
    .bind(input.price)
    .bind(input.stock)
    .bind(at)
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(product)
  }

  #[instrument(name = "PgStore::delete_product", skip(self), err(Display))]
  async fn delete_product(&self, id: ProductId) -> StockroomResult<Option<Product>> {
    let mut tx = self.pool.begin().await?;

    // Same row lock an order takes, so no order can start referencing the
    // product between the usage check and the delete.
    let existing: Option<Product> = sqlx::query_as(
      "SELECT id, name, price, stock, sold, created_at, updated_at FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(product) = existing else {
      tx.rollback().await?;
      return Ok(None);
    };

    let referenced: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM order_products WHERE product_id = $1)")
      .bind(id)
      .fetch_one(&mut *tx)
      .await?;
    if referenced {
      tx.rollback().await?;
      return Err(StockroomError::ProductInUse { product_id: id });
    }

    sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;
    Ok(Some(product))
  }
}

#[async_trait]
impl OrderStore for PgStore {
  #[instrument(name = "PgStore::begin", skip(self), err(Display))]
  async fn begin(&self) -> StockroomResult<Box<dyn StockTransaction>> {
    let mut tx = self.pool.begin().await?;
    if let Some(timeout) = self.statement_timeout {
      // SET does not take bind parameters; the value is a plain integer.
      let stmt = format!("SET LOCAL statement_timeout = {}", timeout.as_millis());
      sqlx::query(&stmt).execute(&mut *tx).await?;
    }
    Ok(Box::new(PgTransaction { tx }))
  }

  #[instrument(name = "PgStore::order_rows", skip(self), err(Display))]
  async fn order_rows(&self) -> StockroomResult<Vec<OrderRow>> {
    let records: Vec<JoinRecord> = sqlx::query_as(
      "SELECT o.id AS order_id, o.created_at AS order_created_at, o.updated_at AS order_updated_at, \
              p.id AS product_id, p.name, p.price, p.stock, p.sold, \
              p.created_at AS product_created_at, p.updated_at AS product_updated_at, op.quantity \
       FROM orders o \
       LEFT JOIN order_products op ON op.order_id = o.id \
       LEFT JOIN products p ON p.id = op.product_id \
       ORDER BY o.id ASC, op.product_id ASC",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(records.into_iter().map(OrderRow::from).collect())
  }

  #[instrument(name = "PgStore::order_header", skip(self), err(Display))]
  async fn order_header(&self, id: OrderId) -> StockroomResult<Option<OrderHeader>> {
    let header: Option<OrderHeader> = sqlx::query_as("SELECT id, created_at, updated_at FROM orders WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(header)
  }

  #[instrument(name = "PgStore::order_lines", skip(self), err(Display))]
  async fn order_lines(&self, id: OrderId) -> StockroomResult<Vec<OrderLine>> {
    fetch_order_lines(&self.pool, id).await
  }
}

/// An open `BEGIN ... COMMIT` block. sqlx rolls the transaction back when this
/// is dropped uncommitted, so an abandoned (e.g. timed out) future leaves no trace.
pub struct PgTransaction {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StockTransaction for PgTransaction {
  async fn lock_products(&mut self, ids: &[ProductId]) -> StockroomResult<Vec<Product>> {
    let products: Vec<Product> = sqlx::query_as(
      "SELECT id, name, price, stock, sold, created_at, updated_at FROM products \
       WHERE id = ANY($1) ORDER BY id ASC FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(&mut *self.tx)
    .await?;
    debug!(requested = ids.len(), locked = products.len(), "Locked product rows.");
    Ok(products)
  }

  async fn take_stock(
    &mut self,
    id: ProductId,
    quantity: i64,
    at: DateTime<Utc>,
  ) -> StockroomResult<Option<Product>> {
    // The stock guard in the WHERE clause keeps the counter from going
    // negative even if a caller skipped `lock_products`.
    let product: Option<Product> = sqlx::query_as(
      "UPDATE products SET stock = stock - $1, sold = sold + $1, updated_at = $2 \
       WHERE id = $3 AND stock >= $1 \
       RETURNING id, name, price, stock, sold, created_at, updated_at",
    )
    .bind(quantity)
    .bind(at)
    .bind(id)
    .fetch_optional(&mut *self.tx)
    .await?;
    Ok(product)
  }

  async fn insert_order(&mut self, at: DateTime<Utc>) -> StockroomResult<OrderHeader> {
    let header: OrderHeader =
      sqlx::query_as("INSERT INTO orders (created_at, updated_at) VALUES ($1, $1) RETURNING id, created_at, updated_at")
        .bind(at)
        .fetch_one(&mut *self.tx)
        .await?;
    Ok(header)
  }

  async fn insert_line(
    &mut self,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    at: DateTime<Utc>,
  ) -> StockroomResult<()> {
    sqlx::query(
      "INSERT INTO order_products (order_id, product_id, quantity, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $4)",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn lock_order(&mut self, id: OrderId) -> StockroomResult<Option<OrderHeader>> {
    let header: Option<OrderHeader> =
      sqlx::query_as("SELECT id, created_at, updated_at FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
    Ok(header)
  }

  async fn order_lines(&mut self, id: OrderId) -> StockroomResult<Vec<OrderLine>> {
    fetch_order_lines(&mut *self.tx, id).await
  }

  async fn delete_order(&mut self, id: OrderId) -> StockroomResult<()> {
    let lines = sqlx::query("DELETE FROM order_products WHERE order_id = $1")
      .bind(id)
      .execute(&mut *self.tx)
      .await?;
    let headers = sqlx::query("DELETE FROM orders WHERE id = $1")
      .bind(id)
      .execute(&mut *self.tx)
      .await?;
    if headers.rows_affected() != 1 {
      warn!(order_id = id, affected = headers.rows_affected(), "Unexpected header delete count.");
    }
    debug!(order_id = id, lines = lines.rows_affected(), "Deleted order rows.");
    Ok(())
  }

  async fn commit(self: Box<Self>) -> StockroomResult<()> {
    self.tx.commit().await?;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StockroomResult<()> {
    self.tx.rollback().await?;
    Ok(())
  }
}
