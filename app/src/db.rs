// stockroom_app/src/db.rs

//! Pool construction, schema bootstrap and sample data.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use stockroom::store::postgres::SCHEMA;
use stockroom::{ProductInput, Stockroom};
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::errors::Result;

const SAMPLE_PRODUCTS: &[(&str, i64, i64)] = &[
  ("Mechanical keyboard", 89_900, 25),
  ("Wireless mouse", 24_900, 60),
  ("27\" monitor", 219_900, 10),
  ("USB-C hub", 39_900, 40),
  ("Laptop stand", 29_900, 15),
];

#[instrument(name = "db::connect", skip(config), fields(max_connections = config.db_max_connections))]
pub async fn connect(config: &AppConfig) -> Result<PgPool> {
  let pool = PgPoolOptions::new()
    .max_connections(config.db_max_connections)
    .acquire_timeout(config.db_acquire_timeout)
    .connect(&config.database_url)
    .await?;
  info!("Successfully connected to the database.");
  Ok(pool)
}

#[instrument(name = "db::apply_schema", skip(pool))]
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
  sqlx::raw_sql(SCHEMA).execute(pool).await?;
  info!("Database schema applied.");
  Ok(())
}

/// Inserts the sample catalog when no product exists yet. Returns how many
/// products were created.
#[instrument(name = "db::seed", skip(stockroom))]
pub async fn seed(stockroom: &Stockroom) -> Result<usize> {
  if !stockroom.list_products().await?.is_empty() {
    info!("Catalog already populated, skipping seed.");
    return Ok(0);
  }
  for (name, price, stock) in SAMPLE_PRODUCTS {
    stockroom.create_product(&ProductInput::new(*name, *price, *stock)).await?;
  }
  info!(count = SAMPLE_PRODUCTS.len(), "Seeded sample products.");
  Ok(SAMPLE_PRODUCTS.len())
}
