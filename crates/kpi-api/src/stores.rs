//! `GET /stores`: every store's year summary.

use axum::{
  Json,
  extract::{Query, State},
};
use kpi_core::{record::StoreYearSummary, source::KpiSource};

use crate::{ApiState, error::ApiError, params::YearsQuery};

/// `GET /stores[?year=<y>&compareYear=<y>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<YearsQuery>,
) -> Result<Json<Vec<StoreYearSummary>>, ApiError>
where
  S: KpiSource,
{
  let years = params.resolve(state.default_year)?;
  let summaries = state
    .source
    .store_year_summaries(years)
    .await
    .map_err(ApiError::data_source("store list"))?;
  Ok(Json(summaries))
}
