//! The `KpiSource` trait.
//!
//! Implemented by data-source backends (`kpi-store-sqlite`, and the in-memory
//! [`MemorySource`](crate::memory::MemorySource)). The JSON API depends on
//! this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  params::{MonthNumber, ReportYears, StoreId, Year},
  record::{
    ComparisonBundle, EnrichedPeriodRecord, NetworkOverview, PeerMonthComparison,
    PeriodAggregate, PeriodRecord, StoreYearSummary, TurnoverRecord,
  },
};

/// Read-only access to the KPI reports.
///
/// Every method is one independent unit of work: it either returns the whole
/// report or fails; a backend must never return a partially-filled report.
/// All futures are `Send` so the trait can be used behind `axum`.
pub trait KpiSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every store with data in `years.year`, with YoY and chain-contribution
  /// figures, largest `TotalSalesYear` first.
  fn store_year_summaries(
    &self,
    years: ReportYears,
  ) -> impl Future<Output = Result<Vec<StoreYearSummary>, Self::Error>> + Send + '_;

  /// The store's monthly rows for `year`, ascending by month.
  fn store_monthly_series(
    &self,
    store: StoreId,
    year: Year,
  ) -> impl Future<Output = Result<Vec<PeriodRecord>, Self::Error>> + Send + '_;

  /// The store's monthly rows with chain figures for the same month and the
  /// store's own comparison-year figures attached.
  fn store_vs_chain_monthly(
    &self,
    store: StoreId,
    years: ReportYears,
  ) -> impl Future<Output = Result<Vec<EnrichedPeriodRecord>, Self::Error>> + Send + '_;

  /// Chain aggregates per month of `year`, ascending.
  fn chain_monthly_totals(
    &self,
    year: Year,
  ) -> impl Future<Output = Result<Vec<PeriodAggregate>, Self::Error>> + Send + '_;

  /// Chain summary, monthly totals and top stores.
  fn network_overview(
    &self,
    years: ReportYears,
  ) -> impl Future<Output = Result<NetworkOverview, Self::Error>> + Send + '_;

  /// Store summary, chain summary and month-by-month peer comparison.
  fn store_comparison(
    &self,
    store: StoreId,
    years: ReportYears,
  ) -> impl Future<Output = Result<ComparisonBundle, Self::Error>> + Send + '_;

  /// Peer averages (all stores) per month of `year` beside the store's own
  /// values; months without store data carry null store fields.
  fn peer_monthly_comparison(
    &self,
    store: StoreId,
    year: Year,
  ) -> impl Future<Output = Result<Vec<PeerMonthComparison>, Self::Error>> + Send + '_;

  /// Turnover rows for the store and year, optionally one month only,
  /// ordered by month, job title, gender.
  fn turnover_breakdown(
    &self,
    store: StoreId,
    year: Year,
    month: Option<MonthNumber>,
  ) -> impl Future<Output = Result<Vec<TurnoverRecord>, Self::Error>> + Send + '_;
}
