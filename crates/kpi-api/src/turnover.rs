//! Handlers for `/store/{id}/turnover` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/store/{id}/turnover` | `?year`, `?month=1..12\|ALL` |
//! | `GET`  | `/store/{id}/turnover/summary` | Same filters, rolled up by job title |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kpi_core::{
  record::TurnoverRecord,
  source::KpiSource,
  turnover::{TurnoverSummary, summarize_turnover},
};

use crate::{
  ApiState,
  error::ApiError,
  params::{TurnoverQuery, store_id},
};

async fn rows<S>(
  state: &ApiState<S>,
  id: &str,
  params: &TurnoverQuery,
) -> Result<Vec<TurnoverRecord>, ApiError>
where
  S: KpiSource,
{
  let store = store_id(id)?;
  let (year, month) = params.resolve(state.default_year)?;
  state
    .source
    .turnover_breakdown(store, year, month)
    .await
    .map_err(ApiError::data_source("turnover breakdown"))
}

/// `GET /store/{id}/turnover`
pub async fn breakdown<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<TurnoverQuery>,
) -> Result<Json<Vec<TurnoverRecord>>, ApiError>
where
  S: KpiSource,
{
  Ok(Json(rows(&state, &id, &params).await?))
}

/// `GET /store/{id}/turnover/summary`
pub async fn summary<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
  Query(params): Query<TurnoverQuery>,
) -> Result<Json<TurnoverSummary>, ApiError>
where
  S: KpiSource,
{
  let records = rows(&state, &id, &params).await?;
  Ok(Json(summarize_turnover(&records)))
}
