//! Error types for `kpi-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A caller-supplied identifier, year or month is malformed.
  #[error("invalid {name}: {reason}")]
  InvalidParameter { name: &'static str, reason: String },

  /// A raw source row lacks a usable identifying key.
  #[error("invalid record: {0}")]
  InvalidRecord(String),
}

impl Error {
  pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
    Self::InvalidParameter { name, reason: reason.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
