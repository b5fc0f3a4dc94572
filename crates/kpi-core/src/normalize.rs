//! Coercion of loosely-typed source values into numbers.
//!
//! Source rows carry numbers as JSON numbers, numeric strings or
//! percent-suffixed strings (`"9.09%"`). Everything here maps a value to a
//! finite `f64` or to `None`; nothing in this module fails on a bad number.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::{
  Error, Result,
  params::{MonthNumber, StoreId, Year},
  record::{PeriodAggregate, PeriodRecord, TurnoverRecord, UNKNOWN_LABEL},
};

/// A dynamically-shaped numeric row: field name to number-or-null.
pub type Row = BTreeMap<String, Option<f64>>;

/// Numeric columns of `vw_Employee_KPI_All`.
pub const PERIOD_FIELDS: &[&str] = &[
  "TotalSales",
  "AvgHeadcount",
  "SalesPerEmployee",
  "HeadcountGrowthPct",
  "Turnover",
];

/// Numeric columns of `vw_Employee_Turnover_ByJobTitle`.
pub const TURNOVER_FIELDS: &[&str] =
  &["Start_Headcount", "End_Headcount", "Terminations", "TurnoverPct"];

/// Parse text as a number, ignoring surrounding whitespace and one trailing
/// `%`.
pub fn parse_number(text: &str) -> Option<f64> {
  let trimmed = text.trim();
  let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
  if trimmed.is_empty() {
    return None;
  }
  trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Coerce a JSON value into a finite number.
pub fn to_number(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
    Value::String(s) => parse_number(s),
    Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
  }
}

/// Normalize the listed fields of a raw row. Absent keys become `None`;
/// fields not in `fields` are dropped.
pub fn normalize_record(raw: &Map<String, Value>, fields: &[&str]) -> Row {
  fields
    .iter()
    .map(|&field| (field.to_owned(), raw.get(field).and_then(to_number)))
    .collect()
}

// ─── Typed construction ──────────────────────────────────────────────────────

fn object(raw: &Value) -> Result<&Map<String, Value>> {
  raw
    .as_object()
    .ok_or_else(|| Error::InvalidRecord("row is not a JSON object".to_owned()))
}

/// A text key that may have been exported as a number (`StoreID: 17`).
fn text_field(raw: &Map<String, Value>, field: &str) -> Option<String> {
  match raw.get(field)? {
    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn store_field(raw: &Map<String, Value>) -> Result<StoreId> {
  let text = text_field(raw, "StoreID")
    .ok_or_else(|| Error::InvalidRecord("missing StoreID".to_owned()))?;
  StoreId::parse(&text).map_err(|e| Error::InvalidRecord(e.to_string()))
}

fn integral_field(raw: &Map<String, Value>, field: &str) -> Result<i64> {
  let value = raw
    .get(field)
    .and_then(to_number)
    .ok_or_else(|| Error::InvalidRecord(format!("missing {field}")))?;
  if value.fract() != 0.0 {
    return Err(Error::InvalidRecord(format!("{field} {value} is not a whole number")));
  }
  Ok(value as i64)
}

fn year_field(raw: &Map<String, Value>) -> Result<Year> {
  let value = integral_field(raw, "Year")?;
  i32::try_from(value)
    .map_err(|_| Error::InvalidRecord(format!("Year {value} out of range")))
    .and_then(|v| Year::new(v).map_err(|e| Error::InvalidRecord(e.to_string())))
}

fn month_field(raw: &Map<String, Value>) -> Result<MonthNumber> {
  let value = integral_field(raw, "MonthNumber")?;
  u8::try_from(value)
    .map_err(|_| Error::InvalidRecord(format!("MonthNumber {value} out of range")))
    .and_then(|v| MonthNumber::new(v).map_err(|e| Error::InvalidRecord(e.to_string())))
}

impl PeriodRecord {
  /// Build a record from a raw source row. Identifying keys must be present
  /// and valid; numeric measures are coerced with [`to_number`], and unknown
  /// fields are ignored.
  pub fn from_raw(raw: &Value) -> Result<Self> {
    let raw = object(raw)?;
    let mut row = normalize_record(raw, PERIOD_FIELDS);
    let mut take = |field: &str| row.remove(field).flatten();
    Ok(Self {
      store_id:             store_field(raw)?,
      year:                 year_field(raw)?,
      month_number:         month_field(raw)?,
      total_sales:          take("TotalSales"),
      avg_headcount:        take("AvgHeadcount"),
      sales_per_employee:   take("SalesPerEmployee"),
      headcount_growth_pct: take("HeadcountGrowthPct"),
      turnover:             take("Turnover"),
    })
  }

  /// The numeric measures keyed by column name, plus `MonthNumber`.
  pub fn to_row(&self) -> Row {
    Row::from([
      ("MonthNumber".to_owned(), Some(f64::from(self.month_number.get()))),
      ("TotalSales".to_owned(), self.total_sales),
      ("AvgHeadcount".to_owned(), self.avg_headcount),
      ("SalesPerEmployee".to_owned(), self.sales_per_employee),
      ("HeadcountGrowthPct".to_owned(), self.headcount_growth_pct),
      ("Turnover".to_owned(), self.turnover),
    ])
  }
}

impl PeriodAggregate {
  /// The aggregate's measures keyed by column name, plus `MonthNumber` when
  /// the aggregate covers one month.
  pub fn to_row(&self) -> Row {
    let mut row = Row::from([
      ("TotalSales".to_owned(), self.total_sales),
      ("AvgSalesPerEmployee".to_owned(), self.avg_sales_per_employee),
      ("AvgHeadcount".to_owned(), self.avg_headcount),
      ("AvgHeadcountGrowth".to_owned(), self.avg_headcount_growth),
      ("AvgTurnover".to_owned(), self.avg_turnover),
      ("StoreCount".to_owned(), Some(f64::from(self.store_count))),
    ]);
    if let Some(month) = self.month_number {
      row.insert("MonthNumber".to_owned(), Some(f64::from(month.get())));
    }
    row
  }
}

impl TurnoverRecord {
  /// Build a record from a raw source row. A missing `JobTitle` or `Gender`
  /// becomes `"Unknown"`.
  pub fn from_raw(raw: &Value) -> Result<Self> {
    let raw = object(raw)?;
    let mut row = normalize_record(raw, TURNOVER_FIELDS);
    let mut take = |field: &str| row.remove(field).flatten();
    Ok(Self {
      store_id:        store_field(raw)?,
      year:            year_field(raw)?,
      month_number:    month_field(raw)?,
      job_title:       text_field(raw, "JobTitle").unwrap_or_else(|| UNKNOWN_LABEL.to_owned()),
      gender:          text_field(raw, "Gender").unwrap_or_else(|| UNKNOWN_LABEL.to_owned()),
      start_headcount: take("Start_Headcount"),
      end_headcount:   take("End_Headcount"),
      terminations:    take("Terminations"),
      turnover_pct:    take("TurnoverPct"),
    })
  }
}
