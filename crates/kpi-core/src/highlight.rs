//! Headline metrics for the summary cards.
//!
//! A highlight is the latest value of one tracked metric plus a delta chip
//! for each comparison that has a usable value: the previous period, the
//! same period of the prior year, and the chain average.

use serde::{Deserialize, Serialize};

use crate::{
  aggregate::PriorMonth,
  format::{
    format_absolute_percent, format_currency, format_currency_cents, format_number,
    format_percent,
  },
  ratio::{finite, percent_change},
  record::{EnrichedPeriodRecord, PeriodRecord},
};

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// A metric shown on the store cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Metric {
  TotalSales,
  AvgHeadcount,
  SalesPerEmployee,
  Turnover,
}

impl Metric {
  /// Card order.
  pub const TRACKED: [Metric; 4] = [
    Metric::TotalSales,
    Metric::AvgHeadcount,
    Metric::SalesPerEmployee,
    Metric::Turnover,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Metric::TotalSales => "Total Sales",
      Metric::AvgHeadcount => "Avg Headcount",
      Metric::SalesPerEmployee => "Sales per Employee",
      Metric::Turnover => "Turnover",
    }
  }

  /// Turnover going down is good news.
  pub fn lower_is_better(self) -> bool { matches!(self, Metric::Turnover) }

  pub fn format(self, value: f64) -> String {
    match self {
      Metric::TotalSales => format_currency(value),
      Metric::AvgHeadcount => format_number(value, 2),
      Metric::SalesPerEmployee => format_currency_cents(value),
      Metric::Turnover => format_absolute_percent(value),
    }
  }
}

/// What a delta chip compares the latest value against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
  PreviousPeriod,
  PriorYear,
  ChainAverage,
}

impl Comparison {
  pub fn label(self) -> &'static str {
    match self {
      Comparison::PreviousPeriod => "vs previous month",
      Comparison::PriorYear => "vs last year",
      Comparison::ChainAverage => "vs chain average",
    }
  }
}

/// Anything that can report a value for each tracked metric.
pub trait MetricValues {
  fn metric(&self, metric: Metric) -> Option<f64>;
}

impl MetricValues for PeriodRecord {
  fn metric(&self, metric: Metric) -> Option<f64> {
    match metric {
      Metric::TotalSales => self.total_sales,
      Metric::AvgHeadcount => self.avg_headcount,
      Metric::SalesPerEmployee => self.sales_per_employee,
      Metric::Turnover => self.turnover,
    }
  }
}

impl MetricValues for PriorMonth {
  fn metric(&self, metric: Metric) -> Option<f64> {
    match metric {
      Metric::TotalSales => self.total_sales,
      Metric::AvgHeadcount => self.avg_headcount,
      Metric::SalesPerEmployee => self.sales_per_employee,
      Metric::Turnover => self.turnover,
    }
  }
}

/// Per-store chain averages for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChainMetrics {
  pub avg_sales:              Option<f64>,
  pub avg_headcount:          Option<f64>,
  pub avg_sales_per_employee: Option<f64>,
  pub avg_turnover:           Option<f64>,
}

impl MetricValues for ChainMetrics {
  fn metric(&self, metric: Metric) -> Option<f64> {
    match metric {
      Metric::TotalSales => self.avg_sales,
      Metric::AvgHeadcount => self.avg_headcount,
      Metric::SalesPerEmployee => self.avg_sales_per_employee,
      Metric::Turnover => self.avg_turnover,
    }
  }
}

impl EnrichedPeriodRecord {
  /// Chain averages for this row's month. Sales compare against the
  /// per-store average, not the chain total.
  pub fn chain_metrics(&self) -> ChainMetrics {
    ChainMetrics {
      avg_sales:              self.chain_avg_sales,
      avg_headcount:          self.chain_avg_headcount,
      avg_sales_per_employee: self.chain_avg_sales_per_employee,
      avg_turnover:           self.chain_avg_turnover,
    }
  }
}

// ─── Highlights ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaChip {
  pub comparison: Comparison,
  pub label:      String,
  /// Percent change, one decimal.
  pub change_pct: f64,
  pub formatted:  String,
  pub favorable:  bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
  pub metric:    Metric,
  pub label:     String,
  pub value:     f64,
  pub formatted: String,
  pub deltas:    Vec<DeltaChip>,
}

/// The last element of a series and the one before it.
#[derive(Debug)]
pub struct LatestAndPrevious<'a, T> {
  pub latest:   Option<&'a T>,
  pub previous: Option<&'a T>,
}

pub fn latest_and_previous<T>(series: &[T]) -> LatestAndPrevious<'_, T> {
  match series {
    [.., previous, latest] => LatestAndPrevious { latest: Some(latest), previous: Some(previous) },
    [latest] => LatestAndPrevious { latest: Some(latest), previous: None },
    [] => LatestAndPrevious { latest: None, previous: None },
  }
}

/// Build one highlight per tracked metric whose latest value is non-null.
///
/// Metrics with a null latest value are left out entirely; a delta chip is
/// emitted only when [`percent_change`] yields a value.
pub fn build_highlights(
  latest:            &dyn MetricValues,
  previous:          Option<&dyn MetricValues>,
  chain_latest:      Option<&dyn MetricValues>,
  prior_year_latest: Option<&dyn MetricValues>,
) -> Vec<Highlight> {
  let comparisons = [
    (Comparison::PreviousPeriod, previous),
    (Comparison::PriorYear, prior_year_latest),
    (Comparison::ChainAverage, chain_latest),
  ];

  Metric::TRACKED
    .into_iter()
    .filter_map(|metric| {
      let value = finite(latest.metric(metric))?;
      let deltas = comparisons
        .iter()
        .filter_map(|(comparison, against)| {
          let base = against.and_then(|a| a.metric(metric));
          let change_pct = percent_change(Some(value), base)?;
          let favorable = if metric.lower_is_better() {
            change_pct <= 0.0
          } else {
            change_pct >= 0.0
          };
          Some(DeltaChip {
            comparison: *comparison,
            label: comparison.label().to_owned(),
            change_pct,
            formatted: format_percent(change_pct),
            favorable,
          })
        })
        .collect();

      Some(Highlight {
        metric,
        label: metric.label().to_owned(),
        value,
        formatted: metric.format(value),
        deltas,
      })
    })
    .collect()
}

/// Highlights for the latest month of a store-vs-chain series.
pub fn store_highlights(series: &[EnrichedPeriodRecord]) -> Vec<Highlight> {
  let LatestAndPrevious { latest, previous } = latest_and_previous(series);
  let Some(latest) = latest else {
    return Vec::new();
  };
  let chain = latest.chain_metrics();
  let prior = latest.prior();
  build_highlights(
    &latest.record,
    previous.map(|p| &p.record as &dyn MetricValues),
    Some(&chain),
    Some(&prior),
  )
}
