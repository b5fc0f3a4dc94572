//! Row types for every report.
//!
//! Field names on the wire follow the reporting view's PascalCase columns
//! (`StoreID`, `TotalSales`, `Start_Headcount`, ...). Every numeric measure is
//! `Option<f64>`: a null in the source stays null all the way to the client.

use serde::{Deserialize, Serialize};

use crate::params::{MonthNumber, StoreId, Year};

// ─── Source rows ─────────────────────────────────────────────────────────────

/// One store's figures for one month, as read from `vw_Employee_KPI_All`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeriodRecord {
  #[serde(rename = "StoreID")]
  pub store_id:             StoreId,
  pub year:                 Year,
  pub month_number:         MonthNumber,
  pub total_sales:          Option<f64>,
  pub avg_headcount:        Option<f64>,
  pub sales_per_employee:   Option<f64>,
  pub headcount_growth_pct: Option<f64>,
  pub turnover:             Option<f64>,
}

/// One (store, month, job title, gender) row of
/// `vw_Employee_Turnover_ByJobTitle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnoverRecord {
  #[serde(rename = "StoreID")]
  pub store_id:        StoreId,
  #[serde(rename = "Year")]
  pub year:            Year,
  #[serde(rename = "MonthNumber")]
  pub month_number:    MonthNumber,
  #[serde(rename = "JobTitle")]
  pub job_title:       String,
  #[serde(rename = "Gender")]
  pub gender:          String,
  #[serde(rename = "Start_Headcount")]
  pub start_headcount: Option<f64>,
  #[serde(rename = "End_Headcount")]
  pub end_headcount:   Option<f64>,
  #[serde(rename = "Terminations")]
  pub terminations:    Option<f64>,
  #[serde(rename = "TurnoverPct")]
  pub turnover_pct:    Option<f64>,
}

/// Placeholder for a missing job title or gender.
pub const UNKNOWN_LABEL: &str = "Unknown";

// ─── Store list ──────────────────────────────────────────────────────────────

/// A store's year totals against its comparison year and the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoreYearSummary {
  #[serde(rename = "StoreID")]
  pub store_id:                        StoreId,
  pub year:                            Year,
  pub compare_year:                    Year,
  pub total_sales_year:                Option<f64>,
  pub avg_sales_per_employee:          Option<f64>,
  pub avg_growth:                      Option<f64>,
  pub prev_year_sales:                 Option<f64>,
  pub prev_year_avg_sales_per_employee: Option<f64>,
  pub prev_year_avg_growth:            Option<f64>,
  #[serde(rename = "SalesYoY")]
  pub sales_yoy:                       Option<f64>,
  #[serde(rename = "SalesPerEmployeeYoY")]
  pub sales_per_employee_yoy:          Option<f64>,
  #[serde(rename = "GrowthYoY")]
  pub growth_yoy:                      Option<f64>,
  pub chain_total_sales:               Option<f64>,
  pub sales_contribution_pct:          Option<f64>,
}

// ─── Chain aggregates ────────────────────────────────────────────────────────

/// Sums and means over a set of stores (the whole chain, or a single store)
/// for one year, or one month of a year when `month_number` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeriodAggregate {
  pub year:                   Year,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub month_number:           Option<MonthNumber>,
  pub total_sales:            Option<f64>,
  pub avg_sales_per_employee: Option<f64>,
  pub avg_headcount:          Option<f64>,
  pub avg_headcount_growth:   Option<f64>,
  pub avg_turnover:           Option<f64>,
  /// Distinct stores with a non-null `TotalSales`.
  pub store_count:            u32,
}

/// A [`PeriodAggregate`] for the target year paired with the comparison year,
/// plus the year-over-year percent of each measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AggregateSummary {
  pub year:                                Year,
  pub compare_year:                        Year,
  pub total_sales_year:                    Option<f64>,
  pub total_sales_compare_year:            Option<f64>,
  pub avg_sales_per_employee:              Option<f64>,
  pub avg_sales_per_employee_compare_year: Option<f64>,
  pub avg_headcount:                       Option<f64>,
  pub avg_headcount_compare_year:          Option<f64>,
  pub avg_turnover:                        Option<f64>,
  pub avg_turnover_compare_year:           Option<f64>,
  pub avg_headcount_growth:                Option<f64>,
  pub avg_headcount_growth_compare_year:   Option<f64>,
  pub store_count:                         u32,
  #[serde(rename = "SalesYoYPct")]
  pub sales_yoy_pct:                       Option<f64>,
  #[serde(rename = "SalesPerEmployeeYoYPct")]
  pub sales_per_employee_yoy_pct:          Option<f64>,
  #[serde(rename = "TurnoverYoYPct")]
  pub turnover_yoy_pct:                    Option<f64>,
  #[serde(rename = "HeadcountGrowthYoYPct")]
  pub headcount_growth_yoy_pct:            Option<f64>,
  #[serde(rename = "HeadcountYoYPct")]
  pub headcount_yoy_pct:                   Option<f64>,
}

// ─── Store vs chain ──────────────────────────────────────────────────────────

/// A store month with the chain figures for the same month and the store's
/// own figures for the same month of the comparison year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EnrichedPeriodRecord {
  #[serde(flatten)]
  pub record:                       PeriodRecord,
  pub chain_total_sales:            Option<f64>,
  pub chain_avg_sales:              Option<f64>,
  pub chain_avg_sales_per_employee: Option<f64>,
  pub chain_avg_headcount:          Option<f64>,
  pub chain_avg_growth:             Option<f64>,
  pub chain_avg_turnover:           Option<f64>,
  /// Stores with a row for this year and month.
  pub chain_store_count:            u32,
  pub prev_year_total_sales:        Option<f64>,
  pub prev_year_sales_per_employee: Option<f64>,
  pub prev_year_avg_headcount:      Option<f64>,
  pub prev_year_headcount_growth:   Option<f64>,
  pub prev_year_turnover:           Option<f64>,
}

/// One month of peer averages (all stores) beside one store's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeerMonthComparison {
  pub month_number:                MonthNumber,
  pub avg_peer_sales:              Option<f64>,
  pub avg_peer_sales_per_employee: Option<f64>,
  pub avg_peer_headcount:          Option<f64>,
  pub avg_peer_headcount_pct:      Option<f64>,
  pub avg_peer_turnover:           Option<f64>,
  pub store_sales:                 Option<f64>,
  pub store_sales_per_employee:    Option<f64>,
  pub store_avg_headcount:         Option<f64>,
  pub store_headcount_growth_pct:  Option<f64>,
  pub store_turnover:              Option<f64>,
}

/// Everything the single-store benchmark view needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonBundle {
  pub store_summary:      AggregateSummary,
  pub peer_summary:       AggregateSummary,
  pub monthly_comparison: Vec<PeerMonthComparison>,
}

// ─── Network overview ────────────────────────────────────────────────────────

/// A row of the network overview's top-stores table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TopStore {
  #[serde(rename = "StoreID")]
  pub store_id:                 StoreId,
  pub total_sales_year:         Option<f64>,
  pub total_sales_compare_year: Option<f64>,
  pub avg_sales_per_employee:   Option<f64>,
  #[serde(rename = "SalesYoYPct")]
  pub sales_yoy_pct:            Option<f64>,
}

/// Chain-wide figures for the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkOverview {
  pub summary:        AggregateSummary,
  pub monthly_totals: Vec<PeriodAggregate>,
  pub top_stores:     Vec<TopStore>,
}
