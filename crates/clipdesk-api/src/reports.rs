//! Dashboard summary endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use clipdesk_core::{
  reports::{self, Stats, TopReferrer},
  store::DashboardStore,
};
use serde_json::{Value, json};

use crate::error::ApiError;

const TOP_REFERRERS: usize = 3;
const RECENT_SUBMISSIONS: usize = 3;

/// `GET /stats`
pub async fn stats<S: DashboardStore>(State(store): State<Arc<S>>) -> Result<Json<Stats>, ApiError> {
  Ok(Json(reports::stats(store.as_ref()).await.map_err(ApiError::store)?))
}

/// `GET /top-employees`
pub async fn top_employees<S: DashboardStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<TopReferrer>>, ApiError> {
  let top = reports::top_referrers(store.as_ref(), TOP_REFERRERS)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(top))
}

/// `GET /recent-submissions`
pub async fn recent_submissions<S: DashboardStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Value>, ApiError> {
  let recent = reports::recent_submissions(store.as_ref(), RECENT_SUBMISSIONS)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "recentSubmissions": recent })))
}
