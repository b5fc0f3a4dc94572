//! SQLite backend for the KPI reports.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Queries read the two reporting views
//! `vw_Employee_KPI_All` and `vw_Employee_Turnover_ByJobTitle`.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteSource;
