//! Rollups over turnover breakdown rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  aggregate::descending_nulls_last,
  ratio::Accumulator,
  record::TurnoverRecord,
};

/// Turnover totals for one job title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTitleTurnover {
  pub job_title:       String,
  /// Mean of the non-null `TurnoverPct` values, 0 when there are none.
  pub avg_turnover:    f64,
  pub terminations:    f64,
  pub start_headcount: f64,
  pub end_headcount:   f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnoverSummary {
  /// Null when no row carries a `TurnoverPct`.
  pub avg_turnover:     Option<f64>,
  pub terminations:     f64,
  pub start_headcount:  f64,
  pub end_headcount:    f64,
  pub headcount_change: f64,
  /// Highest average turnover first.
  pub by_job_title:     Vec<JobTitleTurnover>,
}

#[derive(Default)]
struct Totals {
  turnover:     Accumulator,
  terminations: f64,
  start:        f64,
  end:          f64,
}

impl Totals {
  fn push(&mut self, r: &TurnoverRecord) {
    self.turnover.push(r.turnover_pct);
    self.terminations += r.terminations.unwrap_or(0.0);
    self.start += r.start_headcount.unwrap_or(0.0);
    self.end += r.end_headcount.unwrap_or(0.0);
  }
}

/// Summarize breakdown rows overall and per job title. Null counts are
/// treated as zero; null percentages are left out of the means.
pub fn summarize_turnover(records: &[TurnoverRecord]) -> TurnoverSummary {
  let mut overall = Totals::default();
  let mut per_title: BTreeMap<&str, Totals> = BTreeMap::new();

  for r in records {
    overall.push(r);
    per_title.entry(r.job_title.as_str()).or_default().push(r);
  }

  let mut by_job_title: Vec<JobTitleTurnover> = per_title
    .into_iter()
    .map(|(title, t)| JobTitleTurnover {
      job_title:       title.to_owned(),
      avg_turnover:    t.turnover.mean().unwrap_or(0.0),
      terminations:    t.terminations,
      start_headcount: t.start,
      end_headcount:   t.end,
    })
    .collect();
  by_job_title.sort_by(|a, b| {
    descending_nulls_last(Some(a.avg_turnover), Some(b.avg_turnover))
      .then_with(|| a.job_title.cmp(&b.job_title))
  });

  TurnoverSummary {
    avg_turnover: overall.turnover.mean(),
    terminations: overall.terminations,
    start_headcount: overall.start,
    end_headcount: overall.end,
    headcount_change: overall.end - overall.start,
    by_job_title,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::params::{MonthNumber, StoreId, Year};

  fn row(title: &str, pct: Option<f64>, terms: Option<f64>, start: f64, end: f64) -> TurnoverRecord {
    TurnoverRecord {
      store_id:        StoreId::parse("S1").unwrap(),
      year:            Year::new(2025).unwrap(),
      month_number:    MonthNumber::new(1).unwrap(),
      job_title:       title.to_owned(),
      gender:          "F".to_owned(),
      start_headcount: Some(start),
      end_headcount:   Some(end),
      terminations:    terms,
      turnover_pct:    pct,
    }
  }

  #[test]
  fn groups_by_job_title_and_sorts_by_turnover() {
    let rows = vec![
      row("Cashier", Some(10.0), Some(2.0), 20.0, 18.0),
      row("Cashier", Some(20.0), Some(1.0), 10.0, 10.0),
      row("Manager", Some(0.0), None, 2.0, 2.0),
      row("Stocker", None, Some(1.0), 5.0, 4.0),
    ];
    let summary = summarize_turnover(&rows);

    let titles: Vec<&str> = summary.by_job_title.iter().map(|j| j.job_title.as_str()).collect();
    assert_eq!(titles, ["Cashier", "Manager", "Stocker"]);
    assert_eq!(summary.by_job_title[0].avg_turnover, 15.0);
    assert_eq!(summary.by_job_title[0].terminations, 3.0);
    assert_eq!(summary.by_job_title[2].avg_turnover, 0.0);

    assert_eq!(summary.avg_turnover, Some(10.0));
    assert_eq!(summary.terminations, 4.0);
    assert_eq!(summary.start_headcount, 37.0);
    assert_eq!(summary.end_headcount, 34.0);
    assert_eq!(summary.headcount_change, -3.0);
  }

  #[test]
  fn empty_breakdown() {
    let summary = summarize_turnover(&[]);
    assert_eq!(summary.avg_turnover, None);
    assert!(summary.by_job_title.is_empty());
  }
}
