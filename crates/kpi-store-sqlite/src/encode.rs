//! Decoding of view rows into report types.
//!
//! Rows are read inside the connection thread into plain `Raw*` structs whose
//! numeric cells are already coerced (a view may hand back integers, reals or
//! percent-suffixed text for the same column). Key columns stay raw until
//! [`into_*`](RawPeriod::into_record) so a malformed key surfaces as an
//! [`Error::Decode`] instead of a SQLite type error.

use kpi_core::{
  aggregate::{ChainMonth, PriorMonth, StoreYearRow},
  normalize::parse_number,
  params::{MonthNumber, StoreId, Year},
  ratio::finite,
  record::{
    PeerMonthComparison, PeriodAggregate, PeriodRecord, TopStore, TurnoverRecord,
    UNKNOWN_LABEL,
  },
};
use rusqlite::{Row, types::ValueRef};

use crate::{
  Error, Result,
  schema::{KPI_VIEW, TURNOVER_VIEW},
};

// ─── Cells ───────────────────────────────────────────────────────────────────

/// A numeric cell as a finite `f64`, or `None`.
pub fn number(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
  Ok(match row.get_ref(idx)? {
    ValueRef::Null | ValueRef::Blob(_) => None,
    ValueRef::Integer(i) => Some(i as f64),
    ValueRef::Real(f) => finite(Some(f)),
    ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(parse_number),
  })
}

/// A key cell as text; integer keys are rendered in decimal.
pub fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
  Ok(match row.get_ref(idx)? {
    ValueRef::Null | ValueRef::Blob(_) => None,
    ValueRef::Integer(i) => Some(i.to_string()),
    ValueRef::Real(f) => Some(f.to_string()),
    ValueRef::Text(t) => Some(String::from_utf8_lossy(t).into_owned()),
  })
}

/// An integral key cell. Reals and text are accepted when they hold an
/// integer.
pub fn integer(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
  Ok(match row.get_ref(idx)? {
    ValueRef::Integer(i) => Some(i),
    ValueRef::Real(f) if f.fract() == 0.0 && f.is_finite() => Some(f as i64),
    ValueRef::Text(t) => std::str::from_utf8(t).ok().and_then(|s| s.trim().parse().ok()),
    _ => None,
  })
}

fn count(row: &Row<'_>, idx: usize) -> rusqlite::Result<u32> {
  Ok(
    integer(row, idx)?
      .and_then(|n| u32::try_from(n).ok())
      .unwrap_or(0),
  )
}

// ─── Keys ────────────────────────────────────────────────────────────────────

fn decode_store(view: &'static str, raw: Option<String>) -> Result<StoreId> {
  StoreId::parse(raw.as_deref().unwrap_or_default()).map_err(|e| Error::Decode {
    view,
    column: "StoreID",
    detail: e.to_string(),
  })
}

fn decode_year(view: &'static str, raw: Option<i64>) -> Result<Year> {
  let malformed = |detail: String| Error::Decode { view, column: "Year", detail };
  let value = raw.ok_or_else(|| malformed("null".to_owned()))?;
  i32::try_from(value)
    .map_err(|e| malformed(e.to_string()))
    .and_then(|v| Year::new(v).map_err(|e| malformed(e.to_string())))
}

fn decode_month(view: &'static str, raw: Option<i64>) -> Result<MonthNumber> {
  let malformed = |detail: String| Error::Decode { view, column: "MonthNumber", detail };
  let value = raw.ok_or_else(|| malformed("null".to_owned()))?;
  u8::try_from(value)
    .map_err(|e| malformed(e.to_string()))
    .and_then(|v| MonthNumber::new(v).map_err(|e| malformed(e.to_string())))
}

// ─── Period rows ─────────────────────────────────────────────────────────────

/// `StoreID, Year, MonthNumber, TotalSales, AvgHeadcount, SalesPerEmployee,
/// HeadcountGrowthPct, Turnover` starting at column `at`.
pub struct RawPeriod {
  pub store_id:             Option<String>,
  pub year:                 Option<i64>,
  pub month_number:         Option<i64>,
  pub total_sales:          Option<f64>,
  pub avg_headcount:        Option<f64>,
  pub sales_per_employee:   Option<f64>,
  pub headcount_growth_pct: Option<f64>,
  pub turnover:             Option<f64>,
}

impl RawPeriod {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      store_id:             text(row, at)?,
      year:                 integer(row, at + 1)?,
      month_number:         integer(row, at + 2)?,
      total_sales:          number(row, at + 3)?,
      avg_headcount:        number(row, at + 4)?,
      sales_per_employee:   number(row, at + 5)?,
      headcount_growth_pct: number(row, at + 6)?,
      turnover:             number(row, at + 7)?,
    })
  }

  pub fn into_record(self) -> Result<PeriodRecord> {
    Ok(PeriodRecord {
      store_id:             decode_store(KPI_VIEW, self.store_id)?,
      year:                 decode_year(KPI_VIEW, self.year)?,
      month_number:         decode_month(KPI_VIEW, self.month_number)?,
      total_sales:          self.total_sales,
      avg_headcount:        self.avg_headcount,
      sales_per_employee:   self.sales_per_employee,
      headcount_growth_pct: self.headcount_growth_pct,
      turnover:             self.turnover,
    })
  }
}

/// A store month with the chain figures and prior-year row joined on.
pub struct RawEnriched {
  pub period: RawPeriod,
  pub chain:  ChainMonth,
  pub prior:  PriorMonth,
}

impl RawEnriched {
  /// Period columns 0..8, chain columns 8..14, prior-year columns 14..19.
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      period: RawPeriod::read(row, 0)?,
      chain:  ChainMonth {
        total_sales:            number(row, 8)?,
        avg_sales_per_employee: number(row, 9)?,
        avg_headcount:          number(row, 10)?,
        avg_growth:             number(row, 11)?,
        avg_turnover:           number(row, 12)?,
        store_count:            count(row, 13)?,
      },
      prior:  PriorMonth {
        total_sales:          number(row, 14)?,
        sales_per_employee:   number(row, 15)?,
        avg_headcount:        number(row, 16)?,
        headcount_growth_pct: number(row, 17)?,
        turnover:             number(row, 18)?,
      },
    })
  }
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// `[MonthNumber,] SUM(TotalSales), AVG(SalesPerEmployee), AVG(AvgHeadcount),
/// AVG(HeadcountGrowthPct), AVG(Turnover), StoreCount`.
pub struct RawAggregate {
  pub month_number:           Option<i64>,
  pub total_sales:            Option<f64>,
  pub avg_sales_per_employee: Option<f64>,
  pub avg_headcount:          Option<f64>,
  pub avg_headcount_growth:   Option<f64>,
  pub avg_turnover:           Option<f64>,
  pub store_count:            u32,
}

impl RawAggregate {
  pub fn read(row: &Row<'_>, monthly: bool) -> rusqlite::Result<Self> {
    let at = usize::from(monthly);
    Ok(Self {
      month_number:           if monthly { integer(row, 0)? } else { None },
      total_sales:            number(row, at)?,
      avg_sales_per_employee: number(row, at + 1)?,
      avg_headcount:          number(row, at + 2)?,
      avg_headcount_growth:   number(row, at + 3)?,
      avg_turnover:           number(row, at + 4)?,
      store_count:            count(row, at + 5)?,
    })
  }

  pub fn into_aggregate(self, year: Year) -> Result<PeriodAggregate> {
    Ok(PeriodAggregate {
      year,
      month_number: self
        .month_number
        .map(|m| decode_month(KPI_VIEW, Some(m)))
        .transpose()?,
      total_sales: self.total_sales,
      avg_sales_per_employee: self.avg_sales_per_employee,
      avg_headcount: self.avg_headcount,
      avg_headcount_growth: self.avg_headcount_growth,
      avg_turnover: self.avg_turnover,
      store_count: self.store_count,
    })
  }
}

/// One store's grouped figures for the target and comparison years.
pub struct RawStoreYear {
  pub store_id: Option<String>,
  pub values:   [Option<f64>; 6],
}

impl RawStoreYear {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    let mut values = [None; 6];
    for (i, v) in values.iter_mut().enumerate() {
      *v = number(row, i + 1)?;
    }
    Ok(Self { store_id: text(row, 0)?, values })
  }

  pub fn into_row(self) -> Result<StoreYearRow> {
    let [
      total_sales,
      avg_sales_per_employee,
      avg_growth,
      prev_total_sales,
      prev_avg_sales_per_employee,
      prev_avg_growth,
    ] = self.values;
    Ok(StoreYearRow {
      store_id: decode_store(KPI_VIEW, self.store_id)?,
      total_sales,
      avg_sales_per_employee,
      avg_growth,
      prev_total_sales,
      prev_avg_sales_per_employee,
      prev_avg_growth,
    })
  }
}

pub struct RawTopStore {
  pub store_id:                 Option<String>,
  pub total_sales_year:         Option<f64>,
  pub total_sales_compare_year: Option<f64>,
  pub avg_sales_per_employee:   Option<f64>,
}

impl RawTopStore {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      store_id:                 text(row, 0)?,
      total_sales_year:         number(row, 1)?,
      total_sales_compare_year: number(row, 2)?,
      avg_sales_per_employee:   number(row, 3)?,
    })
  }

  pub fn into_top_store(self) -> Result<TopStore> {
    Ok(TopStore::from_sums(
      decode_store(KPI_VIEW, self.store_id)?,
      self.total_sales_year,
      self.total_sales_compare_year,
      self.avg_sales_per_employee,
    ))
  }
}

/// `MonthNumber`, five peer averages, five store values.
pub struct RawPeerMonth {
  pub month_number: Option<i64>,
  pub values:       [Option<f64>; 10],
}

impl RawPeerMonth {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    let mut values = [None; 10];
    for (i, v) in values.iter_mut().enumerate() {
      *v = number(row, i + 1)?;
    }
    Ok(Self { month_number: integer(row, 0)?, values })
  }

  pub fn into_comparison(self) -> Result<PeerMonthComparison> {
    let [
      avg_peer_sales,
      avg_peer_sales_per_employee,
      avg_peer_headcount,
      avg_peer_headcount_pct,
      avg_peer_turnover,
      store_sales,
      store_sales_per_employee,
      store_avg_headcount,
      store_headcount_growth_pct,
      store_turnover,
    ] = self.values;
    Ok(PeerMonthComparison {
      month_number: decode_month(KPI_VIEW, self.month_number)?,
      avg_peer_sales,
      avg_peer_sales_per_employee,
      avg_peer_headcount,
      avg_peer_headcount_pct,
      avg_peer_turnover,
      store_sales,
      store_sales_per_employee,
      store_avg_headcount,
      store_headcount_growth_pct,
      store_turnover,
    })
  }
}

// ─── Turnover rows ───────────────────────────────────────────────────────────

pub struct RawTurnover {
  pub store_id:        Option<String>,
  pub year:            Option<i64>,
  pub month_number:    Option<i64>,
  pub job_title:       Option<String>,
  pub gender:          Option<String>,
  pub start_headcount: Option<f64>,
  pub end_headcount:   Option<f64>,
  pub terminations:    Option<f64>,
  pub turnover_pct:    Option<f64>,
}

impl RawTurnover {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      store_id:        text(row, 0)?,
      year:            integer(row, 1)?,
      month_number:    integer(row, 2)?,
      job_title:       text(row, 3)?,
      gender:          text(row, 4)?,
      start_headcount: number(row, 5)?,
      end_headcount:   number(row, 6)?,
      terminations:    number(row, 7)?,
      turnover_pct:    number(row, 8)?,
    })
  }

  pub fn into_record(self) -> Result<TurnoverRecord> {
    let label = |s: Option<String>| {
      s.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_owned())
    };
    Ok(TurnoverRecord {
      store_id:        decode_store(TURNOVER_VIEW, self.store_id)?,
      year:            decode_year(TURNOVER_VIEW, self.year)?,
      month_number:    decode_month(TURNOVER_VIEW, self.month_number)?,
      job_title:       label(self.job_title),
      gender:          label(self.gender),
      start_headcount: self.start_headcount,
      end_headcount:   self.end_headcount,
      terminations:    self.terminations,
      turnover_pct:    self.turnover_pct,
    })
  }
}
