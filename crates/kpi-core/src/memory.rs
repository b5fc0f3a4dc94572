//! Every report computed directly over record slices.
//!
//! The free functions are the reference semantics of the aggregation
//! queries: SQL `SUM`/`AVG` null handling via [`Accumulator`], the same
//! grouping keys, the same ordering. [`MemorySource`] wraps them behind
//! [`KpiSource`].

use std::{
  collections::{BTreeMap, BTreeSet},
  convert::Infallible,
};

use crate::{
  aggregate::{
    self, ChainMonth, PriorMonth, StoreYearRow, TOP_STORES_LIMIT, descending_nulls_last,
  },
  params::{MonthNumber, ReportYears, StoreId, Year},
  ratio::Accumulator,
  record::{
    AggregateSummary, ComparisonBundle, EnrichedPeriodRecord, NetworkOverview,
    PeerMonthComparison, PeriodAggregate, PeriodRecord, StoreYearSummary, TopStore,
    TurnoverRecord,
  },
  source::KpiSource,
};

// ─── Grouping helpers ────────────────────────────────────────────────────────

#[derive(Default)]
struct Measures {
  total_sales:          Accumulator,
  avg_headcount:        Accumulator,
  sales_per_employee:   Accumulator,
  headcount_growth_pct: Accumulator,
  turnover:             Accumulator,
  stores:               BTreeSet<StoreId>,
  stores_with_sales:    BTreeSet<StoreId>,
}

impl Measures {
  fn push(&mut self, r: &PeriodRecord) {
    self.total_sales.push(r.total_sales);
    self.avg_headcount.push(r.avg_headcount);
    self.sales_per_employee.push(r.sales_per_employee);
    self.headcount_growth_pct.push(r.headcount_growth_pct);
    self.turnover.push(r.turnover);
    self.stores.insert(r.store_id.clone());
    if r.total_sales.is_some() {
      self.stores_with_sales.insert(r.store_id.clone());
    }
  }

  fn of<'a>(records: impl IntoIterator<Item = &'a PeriodRecord>) -> Self {
    let mut m = Self::default();
    for r in records {
      m.push(r);
    }
    m
  }

  fn into_aggregate(self, year: Year, month_number: Option<MonthNumber>) -> PeriodAggregate {
    PeriodAggregate {
      year,
      month_number,
      total_sales: self.total_sales.sum(),
      avg_sales_per_employee: self.sales_per_employee.mean(),
      avg_headcount: self.avg_headcount.mean(),
      avg_headcount_growth: self.headcount_growth_pct.mean(),
      avg_turnover: self.turnover.mean(),
      store_count: count(&self.stores_with_sales),
    }
  }
}

fn count<T>(set: &BTreeSet<T>) -> u32 { u32::try_from(set.len()).unwrap_or(u32::MAX) }

fn in_year(records: &[PeriodRecord], year: Year) -> impl Iterator<Item = &PeriodRecord> {
  records.iter().filter(move |r| r.year == year)
}

fn by_month<'a>(
  records: impl IntoIterator<Item = &'a PeriodRecord>,
) -> BTreeMap<MonthNumber, Measures> {
  let mut months: BTreeMap<MonthNumber, Measures> = BTreeMap::new();
  for r in records {
    months.entry(r.month_number).or_default().push(r);
  }
  months
}

fn by_store<'a>(
  records: impl IntoIterator<Item = &'a PeriodRecord>,
) -> BTreeMap<StoreId, Measures> {
  let mut stores: BTreeMap<StoreId, Measures> = BTreeMap::new();
  for r in records {
    stores.entry(r.store_id.clone()).or_default().push(r);
  }
  stores
}

// ─── Reports ─────────────────────────────────────────────────────────────────

/// Grouped per-store figures for the target year with the comparison year
/// left-joined.
pub fn store_year_rows(records: &[PeriodRecord], years: ReportYears) -> Vec<StoreYearRow> {
  let current = by_store(in_year(records, years.year));
  let previous = by_store(in_year(records, years.compare_year));

  current
    .into_iter()
    .map(|(store_id, m)| {
      let prev = previous.get(&store_id);
      StoreYearRow {
        total_sales:                 m.total_sales.sum(),
        avg_sales_per_employee:      m.sales_per_employee.mean(),
        avg_growth:                  m.headcount_growth_pct.mean(),
        prev_total_sales:            prev.and_then(|p| p.total_sales.sum()),
        prev_avg_sales_per_employee: prev.and_then(|p| p.sales_per_employee.mean()),
        prev_avg_growth:             prev.and_then(|p| p.headcount_growth_pct.mean()),
        store_id,
      }
    })
    .collect()
}

pub fn store_year_summaries(records: &[PeriodRecord], years: ReportYears) -> Vec<StoreYearSummary> {
  aggregate::store_year_summaries(years, store_year_rows(records, years))
}

pub fn store_monthly_series(
  records: &[PeriodRecord],
  store:   &StoreId,
  year:    Year,
) -> Vec<PeriodRecord> {
  let mut series: Vec<PeriodRecord> = in_year(records, year)
    .filter(|r| &r.store_id == store)
    .cloned()
    .collect();
  series.sort_by_key(|r| r.month_number);
  series
}

pub fn chain_aggregate(records: &[PeriodRecord], year: Year) -> PeriodAggregate {
  Measures::of(in_year(records, year)).into_aggregate(year, None)
}

pub fn store_aggregate(records: &[PeriodRecord], store: &StoreId, year: Year) -> PeriodAggregate {
  Measures::of(in_year(records, year).filter(|r| &r.store_id == store)).into_aggregate(year, None)
}

pub fn chain_monthly_totals(records: &[PeriodRecord], year: Year) -> Vec<PeriodAggregate> {
  by_month(in_year(records, year))
    .into_iter()
    .map(|(month, m)| m.into_aggregate(year, Some(month)))
    .collect()
}

pub fn store_vs_chain_monthly(
  records: &[PeriodRecord],
  store:   &StoreId,
  years:   ReportYears,
) -> Vec<EnrichedPeriodRecord> {
  let chain = by_month(in_year(records, years.year));
  let mut prior_months: BTreeMap<MonthNumber, &PeriodRecord> = BTreeMap::new();
  for p in in_year(records, years.compare_year).filter(|p| &p.store_id == store) {
    prior_months.entry(p.month_number).or_insert(p);
  }

  store_monthly_series(records, store, years.year)
    .into_iter()
    .map(|record| {
      let chain_month = chain
        .get(&record.month_number)
        .map(|m| ChainMonth {
          total_sales:            m.total_sales.sum(),
          avg_sales_per_employee: m.sales_per_employee.mean(),
          avg_headcount:          m.avg_headcount.mean(),
          avg_growth:             m.headcount_growth_pct.mean(),
          avg_turnover:           m.turnover.mean(),
          store_count:            count(&m.stores),
        })
        .unwrap_or_default();
      let prior = prior_months
        .get(&record.month_number)
        .copied()
        .map(PriorMonth::from)
        .unwrap_or_default();
      EnrichedPeriodRecord::new(record, chain_month, prior)
    })
    .collect()
}

/// Top stores by conditional sums over both years.
pub fn top_stores(records: &[PeriodRecord], years: ReportYears, limit: usize) -> Vec<TopStore> {
  #[derive(Default)]
  struct Sums {
    year:    Accumulator,
    compare: Accumulator,
    spe:     Accumulator,
  }

  let mut stores: BTreeMap<&StoreId, Sums> = BTreeMap::new();
  for r in records
    .iter()
    .filter(|r| r.year == years.year || r.year == years.compare_year)
  {
    let s = stores.entry(&r.store_id).or_default();
    s.year.push(if r.year == years.year { r.total_sales } else { Some(0.0) });
    s.compare.push(if r.year == years.compare_year { r.total_sales } else { Some(0.0) });
    s.spe.push(if r.year == years.year { r.sales_per_employee } else { None });
  }

  let mut top: Vec<TopStore> = stores
    .into_iter()
    .map(|(id, s)| TopStore::from_sums(id.clone(), s.year.sum(), s.compare.sum(), s.spe.mean()))
    .collect();
  top.sort_by(|a, b| {
    descending_nulls_last(a.total_sales_year, b.total_sales_year)
      .then_with(|| a.store_id.cmp(&b.store_id))
  });
  top.truncate(limit);
  top
}

pub fn network_overview(records: &[PeriodRecord], years: ReportYears) -> NetworkOverview {
  NetworkOverview {
    summary:        AggregateSummary::between(
      years,
      &chain_aggregate(records, years.year),
      &chain_aggregate(records, years.compare_year),
    ),
    monthly_totals: chain_monthly_totals(records, years.year),
    top_stores:     top_stores(records, years, TOP_STORES_LIMIT),
  }
}

pub fn peer_monthly_comparison(
  records: &[PeriodRecord],
  store:   &StoreId,
  year:    Year,
) -> Vec<PeerMonthComparison> {
  let peers = by_month(in_year(records, year));
  let own = by_month(in_year(records, year).filter(|r| &r.store_id == store));

  peers
    .into_iter()
    .map(|(month, p)| {
      let s = own.get(&month);
      PeerMonthComparison {
        month_number:                month,
        avg_peer_sales:              p.total_sales.mean(),
        avg_peer_sales_per_employee: p.sales_per_employee.mean(),
        avg_peer_headcount:          p.avg_headcount.mean(),
        avg_peer_headcount_pct:      p.headcount_growth_pct.mean(),
        avg_peer_turnover:           p.turnover.mean(),
        store_sales:                 s.and_then(|s| s.total_sales.sum()),
        store_sales_per_employee:    s.and_then(|s| s.sales_per_employee.mean()),
        store_avg_headcount:         s.and_then(|s| s.avg_headcount.mean()),
        store_headcount_growth_pct:  s.and_then(|s| s.headcount_growth_pct.mean()),
        store_turnover:              s.and_then(|s| s.turnover.mean()),
      }
    })
    .collect()
}

pub fn store_comparison(
  records: &[PeriodRecord],
  store:   &StoreId,
  years:   ReportYears,
) -> ComparisonBundle {
  ComparisonBundle {
    store_summary:      AggregateSummary::between(
      years,
      &store_aggregate(records, store, years.year),
      &store_aggregate(records, store, years.compare_year),
    ),
    peer_summary:       AggregateSummary::between(
      years,
      &chain_aggregate(records, years.year),
      &chain_aggregate(records, years.compare_year),
    ),
    monthly_comparison: peer_monthly_comparison(records, store, years.year),
  }
}

pub fn turnover_breakdown(
  records: &[TurnoverRecord],
  store:   &StoreId,
  year:    Year,
  month:   Option<MonthNumber>,
) -> Vec<TurnoverRecord> {
  let mut rows: Vec<TurnoverRecord> = records
    .iter()
    .filter(|r| &r.store_id == store && r.year == year)
    .filter(|r| month.is_none_or(|m| r.month_number == m))
    .cloned()
    .collect();
  rows.sort_by(|a, b| {
    a.month_number
      .cmp(&b.month_number)
      .then_with(|| a.job_title.cmp(&b.job_title))
      .then_with(|| a.gender.cmp(&b.gender))
  });
  rows
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A [`KpiSource`] over records held in memory. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
  periods:  Vec<PeriodRecord>,
  turnover: Vec<TurnoverRecord>,
}

impl MemorySource {
  pub fn new(periods: Vec<PeriodRecord>, turnover: Vec<TurnoverRecord>) -> Self {
    Self { periods, turnover }
  }
}

impl KpiSource for MemorySource {
  type Error = Infallible;

  async fn store_year_summaries(
    &self,
    years: ReportYears,
  ) -> Result<Vec<StoreYearSummary>, Infallible> {
    Ok(store_year_summaries(&self.periods, years))
  }

  async fn store_monthly_series(
    &self,
    store: StoreId,
    year:  Year,
  ) -> Result<Vec<PeriodRecord>, Infallible> {
    Ok(store_monthly_series(&self.periods, &store, year))
  }

  async fn store_vs_chain_monthly(
    &self,
    store: StoreId,
    years: ReportYears,
  ) -> Result<Vec<EnrichedPeriodRecord>, Infallible> {
    Ok(store_vs_chain_monthly(&self.periods, &store, years))
  }

  async fn chain_monthly_totals(&self, year: Year) -> Result<Vec<PeriodAggregate>, Infallible> {
    Ok(chain_monthly_totals(&self.periods, year))
  }

  async fn network_overview(&self, years: ReportYears) -> Result<NetworkOverview, Infallible> {
    Ok(network_overview(&self.periods, years))
  }

  async fn store_comparison(
    &self,
    store: StoreId,
    years: ReportYears,
  ) -> Result<ComparisonBundle, Infallible> {
    Ok(store_comparison(&self.periods, &store, years))
  }

  async fn peer_monthly_comparison(
    &self,
    store: StoreId,
    year:  Year,
  ) -> Result<Vec<PeerMonthComparison>, Infallible> {
    Ok(peer_monthly_comparison(&self.periods, &store, year))
  }

  async fn turnover_breakdown(
    &self,
    store: StoreId,
    year:  Year,
    month: Option<MonthNumber>,
  ) -> Result<Vec<TurnoverRecord>, Infallible> {
    Ok(turnover_breakdown(&self.turnover, &store, year, month))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn y(v: i32) -> Year { Year::new(v).unwrap() }

  fn id(s: &str) -> StoreId { StoreId::parse(s).unwrap() }

  fn years() -> ReportYears { ReportYears { year: y(2025), compare_year: y(2024) } }

  fn rec(store: &str, year: i32, month: u8, sales: Option<f64>) -> PeriodRecord {
    PeriodRecord {
      store_id:             id(store),
      year:                 y(year),
      month_number:         MonthNumber::new(month).unwrap(),
      total_sales:          sales,
      avg_headcount:        Some(10.0),
      sales_per_employee:   sales.map(|s| s / 10.0),
      headcount_growth_pct: Some(1.0),
      turnover:             Some(2.0),
    }
  }

  fn store_list_fixture() -> Vec<PeriodRecord> {
    vec![
      rec("A", 2025, 1, Some(100.0)),
      rec("A", 2025, 2, Some(200.0)),
      rec("A", 2024, 1, Some(150.0)),
      rec("A", 2024, 2, Some(150.0)),
      rec("B", 2025, 1, Some(50.0)),
      rec("B", 2025, 2, Some(50.0)),
    ]
  }

  #[test]
  fn store_list_scenario() {
    let out = store_year_summaries(&store_list_fixture(), years());
    assert_eq!(out.len(), 2);

    let a = &out[0];
    assert_eq!(a.store_id.as_str(), "A");
    assert_eq!(a.total_sales_year, Some(300.0));
    assert_eq!(a.prev_year_sales, Some(300.0));
    assert_eq!(a.sales_yoy, Some(0.0));
    assert_eq!(a.chain_total_sales, Some(400.0));
    assert_eq!(a.sales_contribution_pct, Some(75.0));

    let b = &out[1];
    assert_eq!(b.store_id.as_str(), "B");
    assert_eq!(b.total_sales_year, Some(100.0));
    assert_eq!(b.prev_year_sales, None);
    assert_eq!(b.sales_yoy, None);
    assert_eq!(b.sales_contribution_pct, Some(25.0));
  }

  #[test]
  fn store_only_in_compare_year_is_not_listed() {
    let mut records = store_list_fixture();
    records.push(rec("C", 2024, 1, Some(80.0)));
    let out = store_year_summaries(&records, years());
    assert!(out.iter().all(|s| s.store_id.as_str() != "C"));
  }

  #[test]
  fn monthly_series_is_ascending() {
    let records = vec![
      rec("A", 2025, 3, Some(3.0)),
      rec("A", 2025, 1, Some(1.0)),
      rec("B", 2025, 2, Some(9.0)),
      rec("A", 2024, 2, Some(2.0)),
    ];
    let months: Vec<u8> = store_monthly_series(&records, &id("A"), y(2025))
      .iter()
      .map(|r| r.month_number.get())
      .collect();
    assert_eq!(months, [1, 3]);
  }

  #[test]
  fn store_vs_chain_attaches_chain_and_prior_year() {
    let records = vec![
      rec("A", 2025, 1, Some(100.0)),
      rec("B", 2025, 1, Some(300.0)),
      rec("C", 2025, 1, None),
      rec("A", 2025, 2, Some(120.0)),
      rec("A", 2024, 1, Some(90.0)),
      rec("B", 2024, 2, Some(999.0)),
    ];
    let out = store_vs_chain_monthly(&records, &id("A"), years());
    assert_eq!(out.len(), 2);

    let jan = &out[0];
    assert_eq!(jan.chain_total_sales, Some(400.0));
    assert_eq!(jan.chain_store_count, 3);
    assert!((jan.chain_avg_sales.unwrap() - 400.0 / 3.0).abs() < 1e-9);
    assert_eq!(jan.chain_avg_sales_per_employee, Some(20.0));
    assert_eq!(jan.prev_year_total_sales, Some(90.0));

    let feb = &out[1];
    assert_eq!(feb.chain_store_count, 1);
    assert_eq!(feb.chain_avg_sales, Some(120.0));
    assert_eq!(feb.prev_year_total_sales, None);
  }

  #[test]
  fn peer_comparison_keeps_months_without_store_data() {
    let records = vec![
      rec("S", 2025, 1, Some(10.0)),
      rec("S", 2025, 2, Some(20.0)),
      rec("P", 2025, 1, Some(30.0)),
      rec("P", 2025, 2, Some(40.0)),
      rec("P", 2025, 3, Some(50.0)),
    ];
    let out = peer_monthly_comparison(&records, &id("S"), y(2025));
    assert_eq!(out.len(), 3);
    assert_eq!(out[0].avg_peer_sales, Some(20.0));
    assert_eq!(out[0].store_sales, Some(10.0));
    let march = &out[2];
    assert_eq!(march.month_number.get(), 3);
    assert_eq!(march.avg_peer_sales, Some(50.0));
    assert_eq!(march.store_sales, None);
    assert_eq!(march.store_turnover, None);
  }

  #[test]
  fn network_overview_summary_and_top_stores() {
    let mut records = store_list_fixture();
    records.push(rec("C", 2024, 1, Some(500.0)));
    let overview = network_overview(&records, years());

    assert_eq!(overview.summary.total_sales_year, Some(400.0));
    assert_eq!(overview.summary.total_sales_compare_year, Some(800.0));
    assert_eq!(overview.summary.sales_yoy_pct, Some(-50.0));
    assert_eq!(overview.summary.store_count, 2);

    let months: Vec<u8> = overview
      .monthly_totals
      .iter()
      .map(|m| m.month_number.unwrap().get())
      .collect();
    assert_eq!(months, [1, 2]);
    assert_eq!(overview.monthly_totals[0].total_sales, Some(150.0));

    let ids: Vec<&str> = overview.top_stores.iter().map(|t| t.store_id.as_str()).collect();
    assert_eq!(ids, ["A", "B", "C"]);
    assert_eq!(overview.top_stores[0].sales_yoy_pct, Some(0.0));
    // B has no compare-year rows: the conditional sum is 0, so YoY is null.
    assert_eq!(overview.top_stores[1].total_sales_compare_year, Some(0.0));
    assert_eq!(overview.top_stores[1].sales_yoy_pct, None);
    assert_eq!(overview.top_stores[2].total_sales_year, Some(0.0));
    assert_eq!(overview.top_stores[2].sales_yoy_pct, Some(-100.0));
  }

  #[test]
  fn top_stores_are_limited() {
    let records: Vec<PeriodRecord> = (0..8)
      .map(|i| rec(&format!("S{i}"), 2025, 1, Some(f64::from(i))))
      .collect();
    let top = top_stores(&records, years(), TOP_STORES_LIMIT);
    assert_eq!(top.len(), 5);
    assert_eq!(top[0].store_id.as_str(), "S7");
  }

  #[test]
  fn turnover_filter_scenario() {
    let row = |month: u8, title: &str, gender: &str| TurnoverRecord {
      store_id:        id("S1"),
      year:            y(2025),
      month_number:    MonthNumber::new(month).unwrap(),
      job_title:       title.to_owned(),
      gender:          gender.to_owned(),
      start_headcount: Some(10.0),
      end_headcount:   Some(9.0),
      terminations:    Some(1.0),
      turnover_pct:    Some(10.0),
    };
    let records = vec![
      row(1, "Cashier", "F"),
      row(2, "Stocker", "M"),
      row(2, "Cashier", "M"),
      row(3, "Cashier", "F"),
      row(2, "Cashier", "F"),
    ];

    let out = turnover_breakdown(&records, &id("S1"), y(2025), Some(MonthNumber::new(2).unwrap()));
    let keys: Vec<(u8, &str, &str)> = out
      .iter()
      .map(|r| (r.month_number.get(), r.job_title.as_str(), r.gender.as_str()))
      .collect();
    assert_eq!(keys, [(2, "Cashier", "F"), (2, "Cashier", "M"), (2, "Stocker", "M")]);

    let all = turnover_breakdown(&records, &id("S1"), y(2025), None);
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].month_number.get(), 1);
    assert_eq!(all[4].month_number.get(), 3);
  }

  #[tokio::test]
  async fn memory_source_serves_reports() {
    let source = MemorySource::new(store_list_fixture(), Vec::new());
    let summaries = source.store_year_summaries(years()).await.unwrap();
    assert_eq!(summaries.len(), 2);
    let bundle = source.store_comparison(id("A"), years()).await.unwrap();
    assert_eq!(bundle.store_summary.total_sales_year, Some(300.0));
    assert_eq!(bundle.store_summary.store_count, 1);
    assert_eq!(bundle.peer_summary.total_sales_year, Some(400.0));
    assert_eq!(bundle.monthly_comparison.len(), 2);
  }
}
