//! [`SqliteSource`]: the SQLite implementation of [`KpiSource`].

use std::path::Path;

use kpi_core::{
  aggregate::{self, TOP_STORES_LIMIT},
  params::{MonthNumber, ReportYears, StoreId, Year},
  record::{
    AggregateSummary, ComparisonBundle, EnrichedPeriodRecord, NetworkOverview,
    PeerMonthComparison, PeriodAggregate, PeriodRecord, StoreYearSummary, TopStore,
    TurnoverRecord,
  },
  source::KpiSource,
};
use rusqlite::Connection;
use serde_json::Value;

use crate::{
  Error, Result,
  encode::{
    RawAggregate, RawEnriched, RawPeerMonth, RawPeriod, RawStoreYear, RawTopStore,
    RawTurnover,
  },
  schema::SCHEMA,
};

// ─── Queries ─────────────────────────────────────────────────────────────────

const STORE_YEARS_SQL: &str = "
WITH StoreAggregates AS (
    SELECT StoreID, Year,
           SUM(TotalSales)         AS TotalSales,
           AVG(SalesPerEmployee)   AS AvgSalesPerEmployee,
           AVG(HeadcountGrowthPct) AS AvgGrowth
    FROM vw_Employee_KPI_All
    WHERE Year IN (?1, ?2)
    GROUP BY StoreID, Year
)
SELECT cur.StoreID,
       cur.TotalSales, cur.AvgSalesPerEmployee, cur.AvgGrowth,
       prev.TotalSales, prev.AvgSalesPerEmployee, prev.AvgGrowth
FROM StoreAggregates cur
LEFT JOIN StoreAggregates prev ON prev.StoreID = cur.StoreID AND prev.Year = ?2
WHERE cur.Year = ?1";

const SERIES_SQL: &str = "
SELECT StoreID, Year, MonthNumber, TotalSales, AvgHeadcount, SalesPerEmployee,
       HeadcountGrowthPct, Turnover
FROM vw_Employee_KPI_All
WHERE StoreID = ?1 AND Year = ?2
ORDER BY MonthNumber";

const VS_CHAIN_SQL: &str = "
WITH Chain AS (
    SELECT MonthNumber,
           SUM(TotalSales)         AS ChainTotalSales,
           AVG(SalesPerEmployee)   AS ChainAvgSalesPerEmployee,
           AVG(AvgHeadcount)       AS ChainAvgHeadcount,
           AVG(HeadcountGrowthPct) AS ChainAvgGrowth,
           AVG(Turnover)           AS ChainAvgTurnover,
           COUNT(DISTINCT StoreID) AS ChainStoreCount
    FROM vw_Employee_KPI_All
    WHERE Year = ?2
    GROUP BY MonthNumber
)
SELECT s.StoreID, s.Year, s.MonthNumber, s.TotalSales, s.AvgHeadcount,
       s.SalesPerEmployee, s.HeadcountGrowthPct, s.Turnover,
       c.ChainTotalSales, c.ChainAvgSalesPerEmployee, c.ChainAvgHeadcount,
       c.ChainAvgGrowth, c.ChainAvgTurnover, c.ChainStoreCount,
       p.TotalSales, p.SalesPerEmployee, p.AvgHeadcount, p.HeadcountGrowthPct,
       p.Turnover
FROM vw_Employee_KPI_All s
LEFT JOIN Chain c ON c.MonthNumber = s.MonthNumber
LEFT JOIN vw_Employee_KPI_All p
       ON p.StoreID = s.StoreID AND p.Year = ?3 AND p.MonthNumber = s.MonthNumber
WHERE s.StoreID = ?1 AND s.Year = ?2
ORDER BY s.MonthNumber";

const AGGREGATE_SQL: &str = "
SELECT SUM(TotalSales), AVG(SalesPerEmployee), AVG(AvgHeadcount),
       AVG(HeadcountGrowthPct), AVG(Turnover),
       COUNT(DISTINCT CASE WHEN TotalSales IS NOT NULL THEN StoreID END)
FROM vw_Employee_KPI_All
WHERE Year = ?1 AND (?2 IS NULL OR StoreID = ?2)";

const MONTHLY_TOTALS_SQL: &str = "
SELECT MonthNumber,
       SUM(TotalSales), AVG(SalesPerEmployee), AVG(AvgHeadcount),
       AVG(HeadcountGrowthPct), AVG(Turnover),
       COUNT(DISTINCT CASE WHEN TotalSales IS NOT NULL THEN StoreID END)
FROM vw_Employee_KPI_All
WHERE Year = ?1
GROUP BY MonthNumber
ORDER BY MonthNumber";

const TOP_STORES_SQL: &str = "
SELECT StoreID,
       SUM(CASE WHEN Year = ?1 THEN TotalSales ELSE 0 END) AS TotalSalesYear,
       SUM(CASE WHEN Year = ?2 THEN TotalSales ELSE 0 END) AS TotalSalesCompareYear,
       AVG(CASE WHEN Year = ?1 THEN SalesPerEmployee END)  AS AvgSalesPerEmployee
FROM vw_Employee_KPI_All
WHERE Year IN (?1, ?2)
GROUP BY StoreID
-- inf - inf is NULL: an overflowed total ranks with the nulls, as it decodes to one
ORDER BY CASE WHEN TotalSalesYear - TotalSalesYear = 0 THEN TotalSalesYear END DESC, StoreID
LIMIT ?3";

const PEERS_SQL: &str = "
WITH PeerMonthly AS (
    SELECT MonthNumber,
           AVG(TotalSales)         AS AvgPeerSales,
           AVG(SalesPerEmployee)   AS AvgPeerSalesPerEmployee,
           AVG(AvgHeadcount)       AS AvgPeerHeadcount,
           AVG(HeadcountGrowthPct) AS AvgPeerHeadcountPct,
           AVG(Turnover)           AS AvgPeerTurnover
    FROM vw_Employee_KPI_All
    WHERE Year = ?2
    GROUP BY MonthNumber
),
StoreMonthly AS (
    SELECT MonthNumber,
           SUM(TotalSales)         AS StoreSales,
           AVG(SalesPerEmployee)   AS StoreSalesPerEmployee,
           AVG(AvgHeadcount)       AS StoreAvgHeadcount,
           AVG(HeadcountGrowthPct) AS StoreHeadcountGrowthPct,
           AVG(Turnover)           AS StoreTurnover
    FROM vw_Employee_KPI_All
    WHERE Year = ?2 AND StoreID = ?1
    GROUP BY MonthNumber
)
SELECT p.MonthNumber,
       p.AvgPeerSales, p.AvgPeerSalesPerEmployee, p.AvgPeerHeadcount,
       p.AvgPeerHeadcountPct, p.AvgPeerTurnover,
       s.StoreSales, s.StoreSalesPerEmployee, s.StoreAvgHeadcount,
       s.StoreHeadcountGrowthPct, s.StoreTurnover
FROM PeerMonthly p
LEFT JOIN StoreMonthly s ON s.MonthNumber = p.MonthNumber
ORDER BY p.MonthNumber";

const TURNOVER_SQL: &str = "
SELECT StoreID, Year, MonthNumber, JobTitle, Gender, Start_Headcount,
       End_Headcount, Terminations, TurnoverPct
FROM vw_Employee_Turnover_ByJobTitle
WHERE StoreID = ?1 AND Year = ?2 AND (?3 IS NULL OR MonthNumber = ?3)
ORDER BY MonthNumber, JobTitle, Gender";

const UPSERT_PERIOD_SQL: &str = "
INSERT INTO employee_kpi_monthly
    (store_id, year, month_number, total_sales, avg_headcount,
     sales_per_employee, headcount_growth_pct, turnover)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT (store_id, year, month_number) DO UPDATE SET
    total_sales          = excluded.total_sales,
    avg_headcount        = excluded.avg_headcount,
    sales_per_employee   = excluded.sales_per_employee,
    headcount_growth_pct = excluded.headcount_growth_pct,
    turnover             = excluded.turnover";

const UPSERT_TURNOVER_SQL: &str = "
INSERT INTO employee_turnover_monthly
    (store_id, year, month_number, job_title, gender, start_headcount,
     end_headcount, terminations, turnover_pct)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
ON CONFLICT (store_id, year, month_number, job_title, gender) DO UPDATE SET
    start_headcount = excluded.start_headcount,
    end_headcount   = excluded.end_headcount,
    terminations    = excluded.terminations,
    turnover_pct    = excluded.turnover_pct";

fn query_store_years(conn: &Connection, years: (i32, i32)) -> rusqlite::Result<Vec<RawStoreYear>> {
  let mut stmt = conn.prepare(STORE_YEARS_SQL)?;
  let rows = stmt
    .query_map(rusqlite::params![years.0, years.1], RawStoreYear::read)?
    .collect();
  rows
}

fn query_series(conn: &Connection, store: &str, year: i32) -> rusqlite::Result<Vec<RawPeriod>> {
  let mut stmt = conn.prepare(SERIES_SQL)?;
  let rows = stmt
    .query_map(rusqlite::params![store, year], |row| RawPeriod::read(row, 0))?
    .collect();
  rows
}

fn query_aggregate(
  conn:  &Connection,
  year:  i32,
  store: Option<&str>,
) -> rusqlite::Result<RawAggregate> {
  conn.query_row(AGGREGATE_SQL, rusqlite::params![year, store], |row| {
    RawAggregate::read(row, false)
  })
}

fn query_monthly_totals(conn: &Connection, year: i32) -> rusqlite::Result<Vec<RawAggregate>> {
  let mut stmt = conn.prepare(MONTHLY_TOTALS_SQL)?;
  let rows = stmt
    .query_map(rusqlite::params![year], |row| RawAggregate::read(row, true))?
    .collect();
  rows
}

fn query_peer_months(
  conn:  &Connection,
  store: &str,
  year:  i32,
) -> rusqlite::Result<Vec<RawPeerMonth>> {
  let mut stmt = conn.prepare(PEERS_SQL)?;
  let rows = stmt
    .query_map(rusqlite::params![store, year], RawPeerMonth::read)?
    .collect();
  rows
}

// ─── Decoding bundles ────────────────────────────────────────────────────────

struct RawSummaryPair {
  current:  RawAggregate,
  previous: RawAggregate,
}

impl RawSummaryPair {
  fn read(conn: &Connection, years: ReportYears, store: Option<&str>) -> rusqlite::Result<Self> {
    Ok(Self {
      current:  query_aggregate(conn, years.year.get(), store)?,
      previous: query_aggregate(conn, years.compare_year.get(), store)?,
    })
  }

  fn into_summary(self, years: ReportYears) -> Result<AggregateSummary> {
    Ok(AggregateSummary::between(
      years,
      &self.current.into_aggregate(years.year)?,
      &self.previous.into_aggregate(years.compare_year)?,
    ))
  }
}

fn decode_all<R, T>(raws: Vec<R>, f: impl Fn(R) -> Result<T>) -> Result<Vec<T>> {
  raws.into_iter().map(f).collect()
}

fn decode_monthly_totals(raws: Vec<RawAggregate>, year: Year) -> Result<Vec<PeriodAggregate>> {
  decode_all(raws, |raw| raw.into_aggregate(year))
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// KPI reports backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSource {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSource {
  /// Open (or create) a database at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let source = Self { conn };
    source.init_schema().await?;
    Ok(source)
  }

  /// Open an in-memory database; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let source = Self { conn };
    source.init_schema().await?;
    Ok(source)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Upsert monthly KPI rows in one transaction. Returns the row count.
  pub async fn insert_period_records(&self, records: Vec<PeriodRecord>) -> Result<usize> {
    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT_PERIOD_SQL)?;
          for r in &records {
            stmt.execute(rusqlite::params![
              r.store_id.as_str(),
              r.year.get(),
              r.month_number.get(),
              r.total_sales,
              r.avg_headcount,
              r.sales_per_employee,
              r.headcount_growth_pct,
              r.turnover,
            ])?;
          }
        }
        tx.commit()?;
        Ok(records.len())
      })
      .await?;
    Ok(count)
  }

  /// Upsert turnover rows in one transaction. Returns the row count.
  pub async fn insert_turnover_records(&self, records: Vec<TurnoverRecord>) -> Result<usize> {
    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT_TURNOVER_SQL)?;
          for r in &records {
            stmt.execute(rusqlite::params![
              r.store_id.as_str(),
              r.year.get(),
              r.month_number.get(),
              r.job_title,
              r.gender,
              r.start_headcount,
              r.end_headcount,
              r.terminations,
              r.turnover_pct,
            ])?;
          }
        }
        tx.commit()?;
        Ok(records.len())
      })
      .await?;
    Ok(count)
  }

  /// Import a JSON array of raw KPI rows. Every row is validated before
  /// anything is written; the first bad row aborts the import.
  pub async fn import_period_json(&self, json: &str) -> Result<usize> {
    let records = parse_rows(json, PeriodRecord::from_raw)?;
    self.insert_period_records(records).await
  }

  /// Import a JSON array of raw turnover rows, all or nothing.
  pub async fn import_turnover_json(&self, json: &str) -> Result<usize> {
    let records = parse_rows(json, TurnoverRecord::from_raw)?;
    self.insert_turnover_records(records).await
  }
}

fn parse_rows<T>(json: &str, from_raw: fn(&Value) -> kpi_core::Result<T>) -> Result<Vec<T>> {
  let rows: Vec<Value> = serde_json::from_str(json)?;
  rows
    .iter()
    .enumerate()
    .map(|(index, raw)| from_raw(raw).map_err(|source| Error::ImportRow { index, source }))
    .collect()
}

// ─── KpiSource impl ──────────────────────────────────────────────────────────

impl KpiSource for SqliteSource {
  type Error = Error;

  async fn store_year_summaries(&self, years: ReportYears) -> Result<Vec<StoreYearSummary>> {
    let bounds = (years.year.get(), years.compare_year.get());
    let raws = self
      .conn
      .call(move |conn| Ok(query_store_years(conn, bounds)?))
      .await?;

    let rows = decode_all(raws, RawStoreYear::into_row)?;
    Ok(aggregate::store_year_summaries(years, rows))
  }

  async fn store_monthly_series(&self, store: StoreId, year: Year) -> Result<Vec<PeriodRecord>> {
    let raws = self
      .conn
      .call(move |conn| Ok(query_series(conn, store.as_str(), year.get())?))
      .await?;

    decode_all(raws, RawPeriod::into_record)
  }

  async fn store_vs_chain_monthly(
    &self,
    store: StoreId,
    years: ReportYears,
  ) -> Result<Vec<EnrichedPeriodRecord>> {
    let raws: Vec<RawEnriched> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(VS_CHAIN_SQL)?;
        let rows = stmt
          .query_map(
            rusqlite::params![store.as_str(), years.year.get(), years.compare_year.get()],
            RawEnriched::read,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_all(raws, |raw| {
      Ok(EnrichedPeriodRecord::new(
        raw.period.into_record()?,
        raw.chain,
        raw.prior,
      ))
    })
  }

  async fn chain_monthly_totals(&self, year: Year) -> Result<Vec<PeriodAggregate>> {
    let raws = self
      .conn
      .call(move |conn| Ok(query_monthly_totals(conn, year.get())?))
      .await?;

    decode_monthly_totals(raws, year)
  }

  async fn network_overview(&self, years: ReportYears) -> Result<NetworkOverview> {
    let (pair, months, top) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let pair = RawSummaryPair::read(&tx, years, None)?;
        let months = query_monthly_totals(&tx, years.year.get())?;
        let top = {
          let mut stmt = tx.prepare(TOP_STORES_SQL)?;
          let rows = stmt
            .query_map(
              rusqlite::params![
                years.year.get(),
                years.compare_year.get(),
                i64::try_from(TOP_STORES_LIMIT).unwrap_or(i64::MAX),
              ],
              RawTopStore::read,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };
        tx.commit()?;
        Ok((pair, months, top))
      })
      .await?;

    Ok(NetworkOverview {
      summary:        pair.into_summary(years)?,
      monthly_totals: decode_monthly_totals(months, years.year)?,
      top_stores:     decode_all::<_, TopStore>(top, RawTopStore::into_top_store)?,
    })
  }

  async fn store_comparison(&self, store: StoreId, years: ReportYears) -> Result<ComparisonBundle> {
    let (own, chain, months) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let own = RawSummaryPair::read(&tx, years, Some(store.as_str()))?;
        let chain = RawSummaryPair::read(&tx, years, None)?;
        let months = query_peer_months(&tx, store.as_str(), years.year.get())?;
        tx.commit()?;
        Ok((own, chain, months))
      })
      .await?;

    Ok(ComparisonBundle {
      store_summary:      own.into_summary(years)?,
      peer_summary:       chain.into_summary(years)?,
      monthly_comparison: decode_all(months, RawPeerMonth::into_comparison)?,
    })
  }

  async fn peer_monthly_comparison(
    &self,
    store: StoreId,
    year:  Year,
  ) -> Result<Vec<PeerMonthComparison>> {
    let raws = self
      .conn
      .call(move |conn| Ok(query_peer_months(conn, store.as_str(), year.get())?))
      .await?;

    decode_all(raws, RawPeerMonth::into_comparison)
  }

  async fn turnover_breakdown(
    &self,
    store: StoreId,
    year:  Year,
    month: Option<MonthNumber>,
  ) -> Result<Vec<TurnoverRecord>> {
    let raws: Vec<RawTurnover> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(TURNOVER_SQL)?;
        let rows = stmt
          .query_map(
            rusqlite::params![store.as_str(), year.get(), month.map(MonthNumber::get)],
            RawTurnover::read,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    decode_all(raws, RawTurnover::into_record)
  }
}
