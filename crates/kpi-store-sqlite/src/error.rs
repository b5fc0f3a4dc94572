//! Error type for `kpi-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kpi_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A view returned a key column the reports cannot use.
  #[error("malformed {column} in {view}: {detail}")]
  Decode {
    view:   &'static str,
    column: &'static str,
    detail: String,
  },

  /// An import row was rejected before anything was written.
  #[error("row {index}: {source}")]
  ImportRow {
    index:  usize,
    source: kpi_core::Error,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
