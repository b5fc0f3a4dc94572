//! Derivation of report rows from raw sums and means.
//!
//! Both data sources (SQL and in-memory) produce the raw grouped values
//! defined here and hand them to these functions, so every derived ratio
//! (year-over-year percent, contribution share, chain average) has exactly
//! one definition.

use std::cmp::Ordering;

use crate::{
  params::{ReportYears, StoreId},
  ratio::{Accumulator, contribution_pct, safe_div, yoy_pct},
  record::{
    AggregateSummary, EnrichedPeriodRecord, PeriodAggregate, PeriodRecord,
    StoreYearSummary, TopStore,
  },
};

/// Number of rows in the network overview's top-stores table.
pub const TOP_STORES_LIMIT: usize = 5;

// ─── Store list ──────────────────────────────────────────────────────────────

/// One store's grouped figures for the target year, left-joined with the
/// same figures for the comparison year (all null when absent).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreYearRow {
  pub store_id:                    StoreId,
  pub total_sales:                 Option<f64>,
  pub avg_sales_per_employee:      Option<f64>,
  pub avg_growth:                  Option<f64>,
  pub prev_total_sales:            Option<f64>,
  pub prev_avg_sales_per_employee: Option<f64>,
  pub prev_avg_growth:             Option<f64>,
}

/// Attach YoY and chain-contribution figures to every store row and order the
/// result by `TotalSalesYear` descending.
///
/// The chain total is the sum of every row's `total_sales`, so `rows` must
/// hold every store present in the target year.
pub fn store_year_summaries(
  years: ReportYears,
  rows:  Vec<StoreYearRow>,
) -> Vec<StoreYearSummary> {
  let chain_total = rows
    .iter()
    .map(|r| r.total_sales)
    .collect::<Accumulator>()
    .sum();

  let mut summaries: Vec<StoreYearSummary> = rows
    .into_iter()
    .map(|r| StoreYearSummary {
      store_id:                         r.store_id,
      year:                             years.year,
      compare_year:                     years.compare_year,
      total_sales_year:                 r.total_sales,
      avg_sales_per_employee:           r.avg_sales_per_employee,
      avg_growth:                       r.avg_growth,
      prev_year_sales:                  r.prev_total_sales,
      prev_year_avg_sales_per_employee: r.prev_avg_sales_per_employee,
      prev_year_avg_growth:             r.prev_avg_growth,
      sales_yoy:                        yoy_pct(r.total_sales, r.prev_total_sales),
      sales_per_employee_yoy:           yoy_pct(
        r.avg_sales_per_employee,
        r.prev_avg_sales_per_employee,
      ),
      growth_yoy:                       yoy_pct(r.avg_growth, r.prev_avg_growth),
      chain_total_sales:                chain_total,
      sales_contribution_pct:           contribution_pct(r.total_sales, chain_total),
    })
    .collect();

  summaries.sort_by(|a, b| {
    descending_nulls_last(a.total_sales_year, b.total_sales_year)
      .then_with(|| a.store_id.cmp(&b.store_id))
  });
  summaries
}

/// `ORDER BY x DESC` with nulls after every number.
pub fn descending_nulls_last(a: Option<f64>, b: Option<f64>) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => b.total_cmp(&a),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

// ─── Year-over-year summaries ────────────────────────────────────────────────

impl AggregateSummary {
  /// Pair two aggregates and derive the YoY percent of each measure.
  /// `store_count` is taken from the target year.
  pub fn between(
    years:    ReportYears,
    current:  &PeriodAggregate,
    previous: &PeriodAggregate,
  ) -> Self {
    Self {
      year:                                years.year,
      compare_year:                        years.compare_year,
      total_sales_year:                    current.total_sales,
      total_sales_compare_year:            previous.total_sales,
      avg_sales_per_employee:              current.avg_sales_per_employee,
      avg_sales_per_employee_compare_year: previous.avg_sales_per_employee,
      avg_headcount:                       current.avg_headcount,
      avg_headcount_compare_year:          previous.avg_headcount,
      avg_turnover:                        current.avg_turnover,
      avg_turnover_compare_year:           previous.avg_turnover,
      avg_headcount_growth:                current.avg_headcount_growth,
      avg_headcount_growth_compare_year:   previous.avg_headcount_growth,
      store_count:                         current.store_count,
      sales_yoy_pct:                       yoy_pct(current.total_sales, previous.total_sales),
      sales_per_employee_yoy_pct:          yoy_pct(
        current.avg_sales_per_employee,
        previous.avg_sales_per_employee,
      ),
      turnover_yoy_pct:                    yoy_pct(current.avg_turnover, previous.avg_turnover),
      headcount_growth_yoy_pct:            yoy_pct(
        current.avg_headcount_growth,
        previous.avg_headcount_growth,
      ),
      headcount_yoy_pct:                   yoy_pct(current.avg_headcount, previous.avg_headcount),
    }
  }
}

// ─── Store vs chain ──────────────────────────────────────────────────────────

/// Chain-wide figures for a single year and month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainMonth {
  pub total_sales:            Option<f64>,
  pub avg_sales_per_employee: Option<f64>,
  pub avg_headcount:          Option<f64>,
  pub avg_growth:             Option<f64>,
  pub avg_turnover:           Option<f64>,
  /// Stores with a row for the month.
  pub store_count:            u32,
}

/// A store's figures for the same month of the comparison year. All fields
/// are null when the store has no row for that month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorMonth {
  pub total_sales:          Option<f64>,
  pub sales_per_employee:   Option<f64>,
  pub avg_headcount:        Option<f64>,
  pub headcount_growth_pct: Option<f64>,
  pub turnover:             Option<f64>,
}

impl From<&PeriodRecord> for PriorMonth {
  fn from(r: &PeriodRecord) -> Self {
    Self {
      total_sales:          r.total_sales,
      sales_per_employee:   r.sales_per_employee,
      avg_headcount:        r.avg_headcount,
      headcount_growth_pct: r.headcount_growth_pct,
      turnover:             r.turnover,
    }
  }
}

impl EnrichedPeriodRecord {
  /// `ChainAvgSales` is the chain total divided by the number of stores
  /// reporting that month.
  pub fn new(record: PeriodRecord, chain: ChainMonth, prior: PriorMonth) -> Self {
    Self {
      record,
      chain_total_sales:            chain.total_sales,
      chain_avg_sales:              safe_div(
        chain.total_sales,
        Some(f64::from(chain.store_count)),
      ),
      chain_avg_sales_per_employee: chain.avg_sales_per_employee,
      chain_avg_headcount:          chain.avg_headcount,
      chain_avg_growth:             chain.avg_growth,
      chain_avg_turnover:           chain.avg_turnover,
      chain_store_count:            chain.store_count,
      prev_year_total_sales:        prior.total_sales,
      prev_year_sales_per_employee: prior.sales_per_employee,
      prev_year_avg_headcount:      prior.avg_headcount,
      prev_year_headcount_growth:   prior.headcount_growth_pct,
      prev_year_turnover:           prior.turnover,
    }
  }

  /// The comparison-year values carried by this row.
  pub fn prior(&self) -> PriorMonth {
    PriorMonth {
      total_sales:          self.prev_year_total_sales,
      sales_per_employee:   self.prev_year_sales_per_employee,
      avg_headcount:        self.prev_year_avg_headcount,
      headcount_growth_pct: self.prev_year_headcount_growth,
      turnover:             self.prev_year_turnover,
    }
  }
}

// ─── Top stores ──────────────────────────────────────────────────────────────

impl TopStore {
  /// Build a row from conditional sums over both years.
  pub fn from_sums(
    store_id:                 StoreId,
    total_sales_year:         Option<f64>,
    total_sales_compare_year: Option<f64>,
    avg_sales_per_employee:   Option<f64>,
  ) -> Self {
    Self {
      store_id,
      total_sales_year,
      total_sales_compare_year,
      avg_sales_per_employee,
      sales_yoy_pct: yoy_pct(total_sales_year, total_sales_compare_year),
    }
  }
}
