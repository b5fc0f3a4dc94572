//! Null-safe arithmetic shared by every report.
//!
//! A ratio whose denominator is null or zero is null; no function here ever
//! returns NaN or an infinity.

/// Drop non-finite values.
pub fn finite(value: Option<f64>) -> Option<f64> { value.filter(|v| v.is_finite()) }

/// `numerator / denominator`, or `None` if either side is null or the
/// denominator is zero.
pub fn safe_div(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
  let n = finite(numerator)?;
  let d = finite(denominator)?;
  if d == 0.0 {
    return None;
  }
  finite(Some(n / d))
}

/// Year-over-year percentage: `(current - previous) / previous * 100`.
///
/// Uses the signed `previous` as denominator, matching the aggregation
/// queries. See [`percent_change`] for the card variant.
pub fn yoy_pct(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
  let c = finite(current)?;
  let p = finite(previous)?;
  finite(safe_div(Some(c - p), Some(p)).map(|r| r * 100.0))
}

/// Share of `total` contributed by `part`, in percent.
pub fn contribution_pct(part: Option<f64>, total: Option<f64>) -> Option<f64> {
  finite(safe_div(part, total).map(|r| r * 100.0))
}

/// Period-over-period change for highlight cards:
/// `(current - previous) / |previous| * 100`, rounded to one decimal.
pub fn percent_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
  let c = finite(current)?;
  let p = finite(previous)?;
  finite(safe_div(Some(c - p), Some(p.abs())).map(|r| r * 100.0)).map(|r| round_to(r, 1))
}

/// Round half away from zero to `decimals` places.
///
/// Values too large to scale have no fractional digits and are returned as is.
pub fn round_to(value: f64, decimals: i32) -> f64 {
  let factor = 10f64.powi(decimals);
  let scaled = value * factor;
  if !scaled.is_finite() {
    return value;
  }
  scaled.round() / factor
}

// ─── Accumulator ─────────────────────────────────────────────────────────────

/// Running `SUM` / `AVG` with SQL null semantics: nulls are skipped, and an
/// aggregate over no non-null input is itself null.
///
/// Floats are added with Kahan-Babuska-Neumaier compensation, the same
/// summation SQLite uses for `SUM` and `AVG` over real values. A total that
/// overflows is null.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accumulator {
  sum:          f64,
  compensation: f64,
  count:        u32,
}

impl Accumulator {
  pub fn push(&mut self, value: Option<f64>) {
    let Some(v) = finite(value) else {
      return;
    };
    let t = self.sum + v;
    if self.sum.abs() > v.abs() {
      self.compensation += (self.sum - t) + v;
    } else {
      self.compensation += (v - t) + self.sum;
    }
    self.sum = t;
    self.count += 1;
  }

  pub fn sum(&self) -> Option<f64> {
    if self.count == 0 {
      return None;
    }
    if self.compensation.is_finite() {
      finite(Some(self.sum + self.compensation))
    } else {
      finite(Some(self.sum))
    }
  }

  pub fn mean(&self) -> Option<f64> {
    safe_div(self.sum(), Some(f64::from(self.count)))
  }

  pub fn count(&self) -> u32 { self.count }
}

impl FromIterator<Option<f64>> for Accumulator {
  fn from_iter<I: IntoIterator<Item = Option<f64>>>(iter: I) -> Self {
    let mut acc = Self::default();
    for value in iter {
      acc.push(value);
    }
    acc
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percent_change_is_null_exactly_when_inputs_are_unusable() {
    let values = [None, Some(0.0), Some(-5.0), Some(3.0), Some(f64::NAN)];
    for current in values {
      for previous in values {
        let result = percent_change(current, previous);
        let expect_null = current.is_none_or(|c| !c.is_finite())
          || previous.is_none_or(|p| !p.is_finite() || p == 0.0);
        assert_eq!(result.is_none(), expect_null, "{current:?} vs {previous:?}");
      }
    }
  }

  #[test]
  fn percent_change_uses_absolute_denominator() {
    // -50 -> -25 is an improvement: +50%, where the signed YoY says -50%.
    assert_eq!(percent_change(Some(-25.0), Some(-50.0)), Some(50.0));
    assert_eq!(yoy_pct(Some(-25.0), Some(-50.0)), Some(-50.0));
  }

  #[test]
  fn percent_change_rounds_to_one_decimal() {
    assert_eq!(percent_change(Some(110.0), Some(30.0)), Some(266.7));
    assert_eq!(percent_change(Some(100.0), Some(100.0)), Some(0.0));
  }

  #[test]
  fn yoy_guards_zero_and_null() {
    assert_eq!(yoy_pct(Some(300.0), Some(300.0)), Some(0.0));
    assert_eq!(yoy_pct(Some(100.0), Some(0.0)), None);
    assert_eq!(yoy_pct(Some(100.0), None), None);
    assert_eq!(yoy_pct(None, Some(10.0)), None);
    assert_eq!(yoy_pct(Some(150.0), Some(100.0)), Some(50.0));
  }

  #[test]
  fn contribution_guards_zero_total() {
    assert_eq!(contribution_pct(Some(300.0), Some(400.0)), Some(75.0));
    assert_eq!(contribution_pct(Some(300.0), Some(0.0)), None);
    assert_eq!(contribution_pct(None, Some(400.0)), None);
  }

  #[test]
  fn accumulator_follows_sql_null_semantics() {
    let empty: Accumulator = [None, None].into_iter().collect();
    assert_eq!(empty.sum(), None);
    assert_eq!(empty.mean(), None);

    let acc: Accumulator = [Some(1.0), None, Some(5.0)].into_iter().collect();
    assert_eq!(acc.sum(), Some(6.0));
    assert_eq!(acc.mean(), Some(3.0));
    assert_eq!(acc.count(), 2);
  }

  #[test]
  fn accumulator_compensates_for_cancellation() {
    let values = [0.1, 0.2, 0.3, 1e16, 1.0, -1e16];
    let acc: Accumulator = values.into_iter().map(Some).collect();
    assert_eq!(acc.sum(), Some(1.6));
    assert_eq!(acc.mean(), Some(1.6 / 6.0));

    let naive: f64 = values.iter().sum();
    assert_ne!(naive, 1.6);
  }

  #[test]
  fn overflowing_total_is_null() {
    let acc: Accumulator = [Some(1e308), Some(1e308)].into_iter().collect();
    assert_eq!(acc.sum(), None);
    assert_eq!(acc.mean(), None);
    assert_eq!(acc.count(), 2);
  }

  #[test]
  fn scaled_percentages_never_overflow() {
    assert_eq!(percent_change(Some(1e300), Some(1e-7)), None);
    assert_eq!(yoy_pct(Some(1e300), Some(1e-7)), None);
    assert_eq!(contribution_pct(Some(1e300), Some(1e-7)), None);
    assert_eq!(percent_change(Some(-1e300), Some(1e-7)), None);

    let near_max = percent_change(Some(1e306), Some(1.0)).unwrap();
    assert!(near_max.is_finite(), "{near_max}");
    assert_eq!(round_to(1.7e308, 1), 1.7e308);
  }
}
