//! Core types, formulas and the data-source trait for the KPI reporting
//! service.
//!
//! This crate is free of HTTP and database dependencies. The SQLite backend
//! and the JSON API both depend on it; the in-memory [`memory::MemorySource`]
//! implements every report with plain iterator code.

// We intentionally use native `async fn` in traits.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod format;
pub mod highlight;
pub mod memory;
pub mod merge;
pub mod normalize;
pub mod params;
pub mod ratio;
pub mod record;
pub mod source;
pub mod turnover;

pub use error::{Error, Result};
