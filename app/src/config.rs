// stockroom_app/src/config.rs

use crate::errors::{AppError, Result}; // Use AppError specific Result
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!(
        "Invalid LOG_FORMAT '{}': expected 'pretty' or 'json'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,

  // Pool bounds
  pub db_max_connections: u32,
  pub db_acquire_timeout: Duration,

  /// Deadline for every stockroom operation; also the transaction statement timeout.
  pub request_timeout: Duration,

  pub apply_schema: bool,
  pub seed_db: bool,
  pub log_format: LogFormat,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_or = |var_name: &str, default: &str| lookup(var_name).unwrap_or_else(|| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var::<u16>("SERVER_PORT", &get_or("SERVER_PORT", "8080"))?;
    let database_url = lookup("DATABASE_URL")
      .ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;

    let db_max_connections = parse_var::<u32>("DB_MAX_CONNECTIONS", &get_or("DB_MAX_CONNECTIONS", "10"))?;
    if db_max_connections == 0 {
      return Err(AppError::Config("DB_MAX_CONNECTIONS must be at least 1".to_string()));
    }
    let db_acquire_timeout = Duration::from_secs(parse_var::<u64>(
      "DB_ACQUIRE_TIMEOUT_SECS",
      &get_or("DB_ACQUIRE_TIMEOUT_SECS", "5"),
    )?);
    let request_timeout_ms = parse_var::<u64>("REQUEST_TIMEOUT_MS", &get_or("REQUEST_TIMEOUT_MS", "5000"))?;
    if request_timeout_ms == 0 {
      return Err(AppError::Config("REQUEST_TIMEOUT_MS must be positive".to_string()));
    }

    let apply_schema = parse_var::<bool>("APPLY_SCHEMA", &get_or("APPLY_SCHEMA", "false"))?;
    let seed_db = parse_var::<bool>("SEED_DB", &get_or("SEED_DB", "false"))?;
    let log_format = get_or("LOG_FORMAT", "pretty").parse::<LogFormat>()?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      db_acquire_timeout,
      request_timeout: Duration::from_millis(request_timeout_ms),
      apply_schema,
      seed_db,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn parse_var<T>(var_name: &str, raw: &str) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .trim()
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e)))
}
