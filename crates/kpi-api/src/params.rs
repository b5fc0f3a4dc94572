//! Query-string parameters shared by the report endpoints.
//!
//! Every value arrives as an optional string so that `?year=` (empty) can be
//! treated the same as an absent parameter instead of failing extraction.

use kpi_core::params::{MonthNumber, ReportYears, StoreId, Year};
use serde::Deserialize;

use crate::error::ApiError;

/// `month` value meaning "every month".
pub const ALL_MONTHS: &str = "ALL";

fn supplied(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn year(name: &'static str, value: &Option<String>) -> Result<Option<Year>, ApiError> {
  Ok(supplied(value).map(|s| Year::parse(name, s)).transpose()?)
}

/// `?year&compareYear`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearsQuery {
  pub year:         Option<String>,
  pub compare_year: Option<String>,
}

impl YearsQuery {
  pub fn resolve(&self, default_year: Year) -> Result<ReportYears, ApiError> {
    Ok(ReportYears::resolve(
      year("year", &self.year)?,
      year("compareYear", &self.compare_year)?,
      default_year,
    )?)
  }
}

/// `?year`
#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
  pub year: Option<String>,
}

impl YearQuery {
  pub fn resolve(&self, default_year: Year) -> Result<Year, ApiError> {
    Ok(year("year", &self.year)?.unwrap_or(default_year))
  }
}

/// `?year&month`; `month=ALL` (any case) means no month filter.
#[derive(Debug, Default, Deserialize)]
pub struct TurnoverQuery {
  pub year:  Option<String>,
  pub month: Option<String>,
}

impl TurnoverQuery {
  pub fn resolve(&self, default_year: Year) -> Result<(Year, Option<MonthNumber>), ApiError> {
    let year = year("year", &self.year)?.unwrap_or(default_year);
    let month = supplied(&self.month)
      .filter(|m| !m.eq_ignore_ascii_case(ALL_MONTHS))
      .map(MonthNumber::parse)
      .transpose()?;
    Ok((year, month))
  }
}

/// The `{id}` path segment.
pub fn store_id(raw: &str) -> Result<StoreId, ApiError> { Ok(StoreId::parse(raw)?) }
