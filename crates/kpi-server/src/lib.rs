//! HTTP server assembly for the KPI reporting service.
//!
//! Mounts the [`kpi_api`] router under `/api/kpis`, adds the health route and
//! the CORS and tracing layers. The binary in `main.rs` handles configuration,
//! logging and record import.

use std::{path::PathBuf, sync::Arc};

use axum::{Router, http::Method, routing::get};
use kpi_core::{params::Year, source::KpiSource};
use serde::Deserialize;
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

/// Plain-text body of `GET /`.
pub const HEALTH_TEXT: &str = "KPI API is running...";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `KPI_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_database_path")]
  pub database_path:         PathBuf,
  /// Reporting year used when a request omits `year`. The current calendar
  /// year when unset.
  #[serde(default)]
  pub default_year:          Option<i32>,
  #[serde(default = "default_cors")]
  pub cors_allow_any_origin: bool,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 4000 }

fn default_database_path() -> PathBuf { PathBuf::from("kpi.sqlite3") }

fn default_cors() -> bool { true }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                  default_host(),
      port:                  default_port(),
      database_path:         default_database_path(),
      default_year:          None,
      cors_allow_any_origin: default_cors(),
    }
  }
}

impl ServerConfig {
  /// The configured default year, or `current_year` when none is set.
  pub fn reporting_year(&self, current_year: i32) -> kpi_core::Result<Year> {
    Year::new(self.default_year.unwrap_or(current_year))
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router for `source`.
pub fn app<S>(source: Arc<S>, config: &ServerConfig, default_year: Year) -> Router
where
  S: KpiSource + 'static,
{
  let router = Router::new()
    .route("/", get(|| async { HEALTH_TEXT }))
    .nest("/api/kpis", kpi_api::api_router(source, default_year))
    .layer(TraceLayer::new_for_http());

  if config.cors_allow_any_origin {
    router.layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any),
    )
  } else {
    router
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────
