//! JSON REST API for the KPI reports.
//!
//! Exposes an axum [`Router`] backed by any [`kpi_core::source::KpiSource`].
//! CORS, tracing and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/kpis", kpi_api::api_router(source.clone(), default_year))
//! ```

pub mod error;
pub mod overview;
pub mod params;
pub mod store;
pub mod stores;
pub mod turnover;

use std::sync::Arc;

use axum::{Router, routing::get};
use kpi_core::{params::Year, source::KpiSource};

pub use error::ApiError;

/// State shared by every handler.
pub struct ApiState<S> {
  pub source:       Arc<S>,
  /// Reporting year used when a request omits `year`.
  pub default_year: Year,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { source: Arc::clone(&self.source), default_year: self.default_year }
  }
}

/// Build a fully-materialised API router for `source`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(source: Arc<S>, default_year: Year) -> Router<()>
where
  S: KpiSource + 'static,
{
  Router::new()
    // Store list
    .route("/stores", get(stores::list::<S>))
    // Single store
    .route("/store/{id}", get(store::series::<S>))
    .route("/store/{id}/comparison", get(store::comparison::<S>))
    .route("/store/{id}/chain", get(store::chain::<S>))
    .route("/store/{id}/peers", get(store::peers::<S>))
    .route("/store/{id}/highlights", get(store::highlights::<S>))
    .route("/store/{id}/trend", get(store::trend::<S>))
    // Turnover
    .route("/store/{id}/turnover", get(turnover::breakdown::<S>))
    .route("/store/{id}/turnover/summary", get(turnover::summary::<S>))
    // Network
    .route("/overview", get(overview::handler::<S>))
    .with_state(ApiState { source, default_year })
}

#[cfg(test)]
mod tests;
