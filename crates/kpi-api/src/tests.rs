//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::{io, sync::Arc};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use kpi_core::{
  memory::MemorySource,
  params::{MonthNumber, ReportYears, StoreId, Year},
  record::{
    ComparisonBundle, EnrichedPeriodRecord, NetworkOverview, PeerMonthComparison,
    PeriodAggregate, PeriodRecord, StoreYearSummary, TurnoverRecord,
  },
  source::KpiSource,
};
use serde_json::Value;
use tower::ServiceExt as _;

use crate::api_router;

fn y(v: i32) -> Year { Year::new(v).unwrap() }

fn rec(store: &str, year: i32, month: u8, sales: f64, turnover: Option<f64>) -> PeriodRecord {
  PeriodRecord {
    store_id:             StoreId::parse(store).unwrap(),
    year:                 y(year),
    month_number:         MonthNumber::new(month).unwrap(),
    total_sales:          Some(sales),
    avg_headcount:        Some(10.0),
    sales_per_employee:   Some(sales / 10.0),
    headcount_growth_pct: Some(1.0),
    turnover,
  }
}

fn turnover(month: u8, title: &str, pct: f64) -> TurnoverRecord {
  TurnoverRecord {
    store_id:        StoreId::parse("S1").unwrap(),
    year:            y(2025),
    month_number:    MonthNumber::new(month).unwrap(),
    job_title:       title.to_owned(),
    gender:          "F".to_owned(),
    start_headcount: Some(10.0),
    end_headcount:   Some(8.0),
    terminations:    Some(2.0),
    turnover_pct:    Some(pct),
  }
}

fn router() -> Router {
  let source = MemorySource::new(
    vec![
      rec("A", 2025, 1, 100.0, Some(5.0)),
      rec("A", 2025, 2, 200.0, None),
      rec("A", 2024, 1, 150.0, Some(4.0)),
      rec("A", 2024, 2, 150.0, Some(4.0)),
      rec("B", 2025, 1, 50.0, Some(3.0)),
      rec("B", 2025, 2, 50.0, Some(3.0)),
      rec("B", 2025, 3, 70.0, Some(3.0)),
    ],
    vec![
      turnover(1, "Cashier", 10.0),
      turnover(2, "Stocker", 5.0),
      turnover(2, "Cashier", 20.0),
    ],
  );
  api_router(Arc::new(source), y(2025))
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
  let resp = router.oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

// ─── Store list ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_list_uses_default_years() {
  let (status, body) = get(router(), "/stores").await;
  assert_eq!(status, StatusCode::OK);
  let rows = body.as_array().unwrap();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0]["StoreID"], "A");
  assert_eq!(rows[0]["TotalSalesYear"], 300.0);
  assert_eq!(rows[0]["PrevYearSales"], 300.0);
  assert_eq!(rows[0]["SalesYoY"], 0.0);
  assert_eq!(rows[0]["Year"], 2025);
  assert_eq!(rows[0]["CompareYear"], 2024);
  assert_eq!(rows[1]["StoreID"], "B");
  assert!(rows[1]["SalesYoY"].is_null());
}

#[tokio::test]
async fn empty_query_values_count_as_absent() {
  let (status, body) = get(router(), "/stores?year=&compareYear=").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["Year"], 2025);
}

#[tokio::test]
async fn malformed_year_is_a_bad_request() {
  let (status, body) = get(router(), "/stores?year=abc").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().starts_with("invalid year"));

  let (status, _) = get(router(), "/overview?compareYear=1800").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Single store ────────────────────────────────────────────────────────────

#[tokio::test]
async fn store_series_is_ordered_by_month() {
  let (status, body) = get(router(), "/store/A?year=2024").await;
  assert_eq!(status, StatusCode::OK);
  let months: Vec<i64> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["MonthNumber"].as_i64().unwrap())
    .collect();
  assert_eq!(months, [1, 2]);
}

#[tokio::test]
async fn blank_store_id_is_a_bad_request() {
  let (status, body) = get(router(), "/store/%20%20").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "invalid storeId: must not be empty");
}

#[tokio::test]
async fn comparison_bundle_has_all_parts() {
  let (status, body) = get(router(), "/store/A/comparison").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["storeSummary"]["TotalSalesYear"], 300.0);
  assert_eq!(body["peerSummary"]["TotalSalesYear"], 470.0);
  let months = body["monthlyComparison"].as_array().unwrap();
  assert_eq!(months.len(), 3);
  assert!(months[2]["StoreSales"].is_null());
  assert_eq!(months[2]["AvgPeerSales"], 70.0);
}

#[tokio::test]
async fn chain_rows_carry_chain_and_prior_year_fields() {
  let (status, body) = get(router(), "/store/A/chain").await;
  assert_eq!(status, StatusCode::OK);
  let jan = &body[0];
  assert_eq!(jan["TotalSales"], 100.0);
  assert_eq!(jan["ChainTotalSales"], 150.0);
  assert_eq!(jan["ChainStoreCount"], 2);
  assert_eq!(jan["ChainAvgSales"], 75.0);
  assert_eq!(jan["PrevYearTotalSales"], 150.0);
}

#[tokio::test]
async fn highlights_skip_null_latest_metric() {
  // A's latest month has a null Turnover.
  let (status, body) = get(router(), "/store/A/highlights").await;
  assert_eq!(status, StatusCode::OK);
  let metrics: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|h| h["metric"].as_str().unwrap())
    .collect();
  assert_eq!(metrics.len(), 3);
  assert!(!metrics.iter().any(|m| m.eq_ignore_ascii_case("turnover")));
}

#[tokio::test]
async fn highlights_for_unknown_store_are_empty() {
  let (status, body) = get(router(), "/store/nope/highlights").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn peers_cover_every_chain_month() {
  let (status, body) = get(router(), "/store/A/peers?year=2025").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn trend_merges_store_and_chain_months() {
  let (status, body) = get(router(), "/store/A/trend").await;
  assert_eq!(status, StatusCode::OK);
  let rows = body.as_array().unwrap();
  assert_eq!(rows.len(), 3);
  assert_eq!(rows[0]["MonthNumber"], 1.0);
  assert_eq!(rows[0]["TotalSales"], 100.0);
  assert_eq!(rows[0]["ChainTotalSales"], 150.0);
  assert_eq!(rows[0]["ChainStoreCount"], 2.0);
  assert!(rows[0].get("StoreCount").is_none());
  assert!(rows[0].get("AvgTurnover").is_none());
  assert!(rows[0].get("ChainAvgTurnover").is_some());
  assert!(rows[2]["TotalSales"].is_null());
  assert_eq!(rows[2]["ChainTotalSales"], 70.0);
}

// ─── Turnover ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn turnover_month_filter() {
  let (status, body) = get(router(), "/store/S1/turnover?month=2").await;
  assert_eq!(status, StatusCode::OK);
  let titles: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["JobTitle"].as_str().unwrap())
    .collect();
  assert_eq!(titles, ["Cashier", "Stocker"]);

  let (_, all) = get(router(), "/store/S1/turnover?month=ALL").await;
  assert_eq!(all.as_array().unwrap().len(), 3);

  let (status, _) = get(router(), "/store/S1/turnover?month=0").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn turnover_summary_rolls_up_by_title() {
  let (status, body) = get(router(), "/store/S1/turnover/summary").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["terminations"], 6.0);
  assert_eq!(body["headcountChange"], -6.0);
  assert_eq!(body["byJobTitle"][0]["jobTitle"], "Cashier");
  assert_eq!(body["byJobTitle"][0]["avgTurnover"], 15.0);
}

// ─── Overview ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn overview_has_summary_months_and_top_stores() {
  let (status, body) = get(router(), "/overview?year=2025&compareYear=2024").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["summary"]["TotalSalesYear"], 470.0);
  assert_eq!(body["monthlyTotals"].as_array().unwrap().len(), 3);
  let top = body["topStores"].as_array().unwrap();
  assert_eq!(top[0]["StoreID"], "A");
  assert_eq!(top[1]["StoreID"], "B");
}

// ─── Data-source failures ────────────────────────────────────────────────────

/// Every report fails.
struct Unreachable;

fn down() -> io::Error { io::Error::new(io::ErrorKind::ConnectionRefused, "secret host db01") }

impl KpiSource for Unreachable {
  type Error = io::Error;

  async fn store_year_summaries(&self, _: ReportYears) -> io::Result<Vec<StoreYearSummary>> {
    Err(down())
  }

  async fn store_monthly_series(&self, _: StoreId, _: Year) -> io::Result<Vec<PeriodRecord>> {
    Err(down())
  }

  async fn store_vs_chain_monthly(
    &self,
    _: StoreId,
    _: ReportYears,
  ) -> io::Result<Vec<EnrichedPeriodRecord>> {
    Err(down())
  }

  async fn chain_monthly_totals(&self, _: Year) -> io::Result<Vec<PeriodAggregate>> {
    Err(down())
  }

  async fn network_overview(&self, _: ReportYears) -> io::Result<NetworkOverview> {
    Err(down())
  }

  async fn store_comparison(&self, _: StoreId, _: ReportYears) -> io::Result<ComparisonBundle> {
    Err(down())
  }

  async fn peer_monthly_comparison(
    &self,
    _: StoreId,
    _: Year,
  ) -> io::Result<Vec<PeerMonthComparison>> {
    Err(down())
  }

  async fn turnover_breakdown(
    &self,
    _: StoreId,
    _: Year,
    _: Option<MonthNumber>,
  ) -> io::Result<Vec<TurnoverRecord>> {
    Err(down())
  }
}

#[tokio::test]
async fn data_source_failure_is_a_generic_500() {
  for uri in [
    "/stores",
    "/store/A",
    "/store/A/comparison",
    "/store/A/chain",
    "/store/A/peers",
    "/store/A/highlights",
    "/store/A/trend",
    "/store/A/turnover",
    "/store/A/turnover/summary",
    "/overview",
  ] {
    let router = api_router(Arc::new(Unreachable), y(2025));
    let (status, body) = get(router, uri).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
    assert_eq!(body["error"], "Database query failed", "{uri}");
  }
}

#[tokio::test]
async fn parameter_errors_win_over_data_source_errors() {
  let router = api_router(Arc::new(Unreachable), y(2025));
  let (status, _) = get(router, "/store/A/turnover?month=July").await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
