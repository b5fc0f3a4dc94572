//! Handlers for `/store/{id}` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/store/{id}` | Monthly series for `?year` |
//! | `GET`  | `/store/{id}/comparison` | Store vs peer bundle, `?year&compareYear` |
//! | `GET`  | `/store/{id}/chain` | Months enriched with chain and prior-year figures |
//! | `GET`  | `/store/{id}/peers` | Peer averages per month for `?year` |
//! | `GET`  | `/store/{id}/highlights` | Headline metrics for the latest month |
//! | `GET`  | `/store/{id}/trend` | Store months merged with chain monthly totals |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kpi_core::{
  highlight::{Highlight, store_highlights},
  merge::{merge_by_key, prefix_fields},
  normalize::Row,
  record::{ComparisonBundle, EnrichedPeriodRecord, PeerMonthComparison, PeriodRecord},
  source::KpiSource,
};

use crate::{
  ApiState,
  error::ApiError,
  params::{YearQuery, YearsQuery, store_id},
};

/// Prefix for every chain column in `/trend`.
pub const CHAIN_PREFIX: &str = "Chain";

// ─── Series ──────────────────────────────────────────────────────────────────

/// `GET /store/{id}[?year=<y>]`
pub async fn series<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<YearQuery>,
) -> Result<Json<Vec<PeriodRecord>>, ApiError>
where
  S: KpiSource,
{
  let store = store_id(&id)?;
  let year = params.resolve(state.default_year)?;
  let rows = state
    .source
    .store_monthly_series(store, year)
    .await
    .map_err(ApiError::data_source("store monthly series"))?;
  Ok(Json(rows))
}

// ─── Comparison ──────────────────────────────────────────────────────────────

/// `GET /store/{id}/comparison[?year=<y>&compareYear=<y>]`
pub async fn comparison<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<YearsQuery>,
) -> Result<Json<ComparisonBundle>, ApiError>
where
  S: KpiSource,
{
  let store = store_id(&id)?;
  let years = params.resolve(state.default_year)?;
  let bundle = state
    .source
    .store_comparison(store, years)
    .await
    .map_err(ApiError::data_source("store comparison"))?;
  Ok(Json(bundle))
}

// ─── Chain ───────────────────────────────────────────────────────────────────

async fn chain_series<S>(
  state: &ApiState<S>,
  id: &str,
  params: &YearsQuery,
) -> Result<Vec<EnrichedPeriodRecord>, ApiError>
where
  S: KpiSource,
{
  let store = store_id(id)?;
  let years = params.resolve(state.default_year)?;
  state
    .source
    .store_vs_chain_monthly(store, years)
    .await
    .map_err(ApiError::data_source("store vs chain"))
}

/// `GET /store/{id}/chain[?year=<y>&compareYear=<y>]`
pub async fn chain<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<YearsQuery>,
) -> Result<Json<Vec<EnrichedPeriodRecord>>, ApiError>
where
  S: KpiSource,
{
  Ok(Json(chain_series(&state, &id, &params).await?))
}

/// `GET /store/{id}/highlights[?year=<y>&compareYear=<y>]`
pub async fn highlights<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<YearsQuery>,
) -> Result<Json<Vec<Highlight>>, ApiError>
where
  S: KpiSource,
{
  let series = chain_series(&state, &id, &params).await?;
  Ok(Json(store_highlights(&series)))
}

// ─── Peers ───────────────────────────────────────────────────────────────────

/// `GET /store/{id}/peers[?year=<y>]`
pub async fn peers<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<YearQuery>,
) -> Result<Json<Vec<PeerMonthComparison>>, ApiError>
where
  S: KpiSource,
{
  let store = store_id(&id)?;
  let year = params.resolve(state.default_year)?;
  let months = state
    .source
    .peer_monthly_comparison(store, year)
    .await
    .map_err(ApiError::data_source("peer comparison"))?;
  Ok(Json(months))
}

// ─── Trend ───────────────────────────────────────────────────────────────────

/// `GET /store/{id}/trend[?year=<y>]`
///
/// One row per month present in either series. Store columns keep their
/// names; every chain column is prefixed with `Chain`.
pub async fn trend<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<YearQuery>,
) -> Result<Json<Vec<Row>>, ApiError>
where
  S: KpiSource,
{
  let store = store_id(&id)?;
  let year = params.resolve(state.default_year)?;

  let (series, totals) = tokio::try_join!(
    async {
      state
        .source
        .store_monthly_series(store, year)
        .await
        .map_err(ApiError::data_source("store monthly series"))
    },
    async {
      state
        .source
        .chain_monthly_totals(year)
        .await
        .map_err(ApiError::data_source("chain monthly totals"))
    },
  )?;

  let store_rows: Vec<Row> = series.iter().map(PeriodRecord::to_row).collect();
  let chain_rows: Vec<Row> = totals.iter().map(|t| t.to_row()).collect();
  let chain_rows = prefix_fields(&chain_rows, "MonthNumber", CHAIN_PREFIX);
  Ok(Json(merge_by_key(&store_rows, &chain_rows, "MonthNumber", CHAIN_PREFIX)))
}
