//! Validated report parameters.
//!
//! Every identifier that reaches a query goes through one of these newtypes,
//! so a malformed value is rejected instead of silently becoming a zero or
//! an empty result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Year ────────────────────────────────────────────────────────────────────

/// A reporting year.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub struct Year(i32);

impl Year {
  pub const MIN: i32 = 1900;
  pub const MAX: i32 = 9999;

  pub fn new(value: i32) -> Result<Self> {
    if (Self::MIN..=Self::MAX).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::invalid(
        "year",
        format!("{value} is outside {}..={}", Self::MIN, Self::MAX),
      ))
    }
  }

  /// Parse a year from query-string text.
  pub fn parse(name: &'static str, text: &str) -> Result<Self> {
    let value: i32 = text
      .trim()
      .parse()
      .map_err(|_| Error::invalid(name, format!("{text:?} is not an integer")))?;
    Self::new(value).map_err(|e| match e {
      Error::InvalidParameter { reason, .. } => Error::invalid(name, reason),
      other => other,
    })
  }

  pub fn get(self) -> i32 { self.0 }

  /// The year before this one, used as the default comparison year.
  ///
  /// Fails as `compareYear`, since that is the parameter being defaulted.
  pub fn previous(self) -> Result<Self> {
    Self::new(self.0 - 1).map_err(|_| {
      Error::invalid(
        "compareYear",
        format!("defaults to {} for year {}, which is before {}", self.0 - 1, self.0, Self::MIN),
      )
    })
  }
}

impl TryFrom<i32> for Year {
  type Error = Error;

  fn try_from(value: i32) -> Result<Self> { Self::new(value) }
}

impl From<Year> for i32 {
  fn from(year: Year) -> Self { year.0 }
}

impl fmt::Display for Year {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Month ───────────────────────────────────────────────────────────────────

/// A calendar month, 1 through 12.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct MonthNumber(u8);

impl MonthNumber {
  pub fn new(value: u8) -> Result<Self> {
    if (1..=12).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::invalid("month", format!("{value} is outside 1..=12")))
    }
  }

  pub fn parse(text: &str) -> Result<Self> {
    let value: u8 = text
      .trim()
      .parse()
      .map_err(|_| Error::invalid("month", format!("{text:?} is not a month number")))?;
    Self::new(value)
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for MonthNumber {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> { Self::new(value) }
}

impl From<MonthNumber> for u8 {
  fn from(month: MonthNumber) -> Self { month.0 }
}

impl fmt::Display for MonthNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A store identifier as it appears in the reporting view's `StoreID` column.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct StoreId(String);

impl StoreId {
  pub const MAX_LEN: usize = 64;

  /// Trims surrounding whitespace and rejects empty, oversized or
  /// control-character-bearing identifiers.
  pub fn parse(text: &str) -> Result<Self> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
      return Err(Error::invalid("storeId", "must not be empty"));
    }
    if trimmed.chars().count() > Self::MAX_LEN {
      return Err(Error::invalid(
        "storeId",
        format!("longer than {} characters", Self::MAX_LEN),
      ));
    }
    if trimmed.chars().any(char::is_control) {
      return Err(Error::invalid("storeId", "contains control characters"));
    }
    Ok(Self(trimmed.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for StoreId {
  type Error = Error;

  fn try_from(value: String) -> Result<Self> { Self::parse(&value) }
}

impl From<StoreId> for String {
  fn from(id: StoreId) -> Self { id.0 }
}

impl fmt::Display for StoreId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Year pair ───────────────────────────────────────────────────────────────

/// The target year of a report and the year it is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportYears {
  pub year:         Year,
  pub compare_year: Year,
}

impl ReportYears {
  /// Fill in whichever of `year` and `compare_year` was not supplied:
  /// `year` falls back to `default_year`, `compare_year` to `year - 1`.
  pub fn resolve(
    year:         Option<Year>,
    compare_year: Option<Year>,
    default_year: Year,
  ) -> Result<Self> {
    let year = year.unwrap_or(default_year);
    let compare_year = match compare_year {
      Some(y) => y,
      None    => year.previous()?,
    };
    Ok(Self { year, compare_year })
  }
}
