// stockroom/src/catalog.rs

//! Product operations on top of a `ProductStore`. Unknown ids surface as
//! `ProductNotFound`; the timestamps are taken here.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::{StockroomError, StockroomResult};
use crate::model::{Product, ProductId, ProductInput};
use crate::store::ProductStore;

#[instrument(name = "catalog::list_products", skip(store), err(Display))]
pub async fn list_products<S>(store: &S) -> StockroomResult<Vec<Product>>
where
  S: ProductStore + ?Sized,
{
  store.list_products().await
}

#[instrument(name = "catalog::create_product", skip(store, input), fields(name = %input.name), err(Display))]
pub async fn create_product<S>(store: &S, input: &ProductInput) -> StockroomResult<Product>
where
  S: ProductStore + ?Sized,
{
  let product = store.create_product(input, Utc::now()).await?;
  info!(product_id = product.id, "Product created.");
  Ok(product)
}

#[instrument(name = "catalog::product", skip(store), err(Display))]
pub async fn product<S>(store: &S, product_id: ProductId) -> StockroomResult<Product>
where
  S: ProductStore + ?Sized,
{
  store
    .product(product_id)
    .await?
    .ok_or(StockroomError::ProductNotFound { product_id })
}

#[instrument(name = "catalog::update_product", skip(store, input), err(Display))]
pub async fn update_product<S>(store: &S, product_id: ProductId, input: &ProductInput) -> StockroomResult<Product>
where
  S: ProductStore + ?Sized,
{
  let product = store
    .update_product(product_id, input, Utc::now())
    .await?
    .ok_or(StockroomError::ProductNotFound { product_id })?;
  info!(product_id, "Product updated.");
  Ok(product)
}

/// Deletes a product nobody ordered yet and returns its last state.
#[instrument(name = "catalog::delete_product", skip(store), err(Display))]
pub async fn delete_product<S>(store: &S, product_id: ProductId) -> StockroomResult<Product>
where
  S: ProductStore + ?Sized,
{
  match store.delete_product(product_id).await {
    Ok(Some(product)) => {
      info!(product_id, "Product deleted.");
      Ok(product)
    }
    Ok(None) => Err(StockroomError::ProductNotFound { product_id }),
    Err(e @ StockroomError::ProductInUse { .. }) => {
      warn!(product_id, "Refusing to delete a product referenced by orders.");
      Err(e)
    }
    Err(e) => Err(e),
  }
}
