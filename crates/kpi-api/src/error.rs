//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Body text for every data-source failure. The underlying error is logged,
/// never sent to the client.
pub const DATA_SOURCE_MESSAGE: &str = "Database query failed";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// A malformed `storeId`, `year`, `compareYear` or `month`.
  #[error(transparent)]
  InvalidParameter(#[from] kpi_core::Error),

  /// The data source was unreachable or rejected the query.
  #[error("{report} failed: {source}")]
  DataSource {
    report: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a data-source error raised while producing `report`.
  pub fn data_source<E>(report: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| ApiError::DataSource { report, source: Box::new(e) }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::InvalidParameter(e) => (StatusCode::BAD_REQUEST, e.to_string()),
      ApiError::DataSource { report, source } => {
        tracing::error!(report, error = %source, "data source query failed");
        (StatusCode::INTERNAL_SERVER_ERROR, DATA_SOURCE_MESSAGE.to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
