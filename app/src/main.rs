// stockroom_app/src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use stockroom::{PgStore, Stockroom};
use stockroom_app::web::{configure_app_routes, route_not_found_handler};
use stockroom_app::{db, AppConfig, AppState, LogFormat};
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  // RUST_LOG overrides the default level.
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);
  init_tracing(app_config.log_format);
  tracing::info!(
    address = %app_config.bind_address(),
    max_connections = app_config.db_max_connections,
    request_timeout_ms = app_config.request_timeout.as_millis() as u64,
    "Starting stockroom server..."
  );

  let db_pool = db::connect(&app_config).await.context("connecting to the database")?;
  if app_config.apply_schema {
    db::apply_schema(&db_pool).await.context("applying schema")?;
  }

  let store = PgStore::new(db_pool).with_statement_timeout(app_config.request_timeout);
  let stockroom = Stockroom::new(Arc::new(store)).with_deadline(app_config.request_timeout);

  if app_config.seed_db {
    db::seed(&stockroom).await.context("seeding database")?;
  }

  let app_state = AppState::new(stockroom, app_config.clone());
  let server_address = app_config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Actix middleware for tracing requests
      .configure(configure_app_routes)
      .default_service(actix_data::to(route_not_found_handler))
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await?;

  tracing::info!("Server stopped.");
  Ok(())
}
