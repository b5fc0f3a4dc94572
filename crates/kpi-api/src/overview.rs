//! `GET /overview`: chain-wide summary, monthly totals and top stores.

use axum::{
  Json,
  extract::{Query, State},
};
use kpi_core::{record::NetworkOverview, source::KpiSource};

use crate::{ApiState, error::ApiError, params::YearsQuery};

/// `GET /overview[?year=<y>&compareYear=<y>]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<YearsQuery>,
) -> Result<Json<NetworkOverview>, ApiError>
where
  S: KpiSource,
{
  let years = params.resolve(state.default_year)?;
  let overview = state
    .source
    .network_overview(years)
    .await
    .map_err(ApiError::data_source("network overview"))?;
  Ok(Json(overview))
}
