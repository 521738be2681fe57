use std::sync::Arc;

use axum::{extract::State, Json};

use super::common::{run_blocking, ApiQuery, CurrentActor, HttpError};
use crate::api::{DashboardFilter, DashboardSummary};
use crate::app::state::AppState;

pub(super) async fn summary(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
    ApiQuery(filter): ApiQuery<DashboardFilter>,
) -> Result<Json<DashboardSummary>, HttpError> {
    let api = state.dashboard_api.clone();
    let summary = run_blocking("http.dashboard_summary", move || api.summary(&filter)).await?;
    Ok(Json(summary))
}
