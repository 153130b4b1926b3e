//! Handlers for submission endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/submit-video` | Public form; 400 lists missing fields |
//! | `GET`    | `/submissions` | Rows with the referrer's current name/email |
//! | `GET`    | `/submissions/:id` | Full record; 404 if not found |
//! | `DELETE` | `/submissions/:id` | 404 if already gone |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::HeaderMap,
};
use clipdesk_core::{
  dispatch::Dispatcher,
  mail::MailTransport,
  reports::{self, SubmissionDetail, SubmissionRow},
  signature::ArtifactStore,
  store::DashboardStore,
  submission::SubmissionPayload,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiError;

/// Header a trusted reverse proxy sets to the real client address.
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// The first address in `X-Forwarded-For`, if any.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
  headers
    .get(FORWARDED_FOR)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .map(str::trim)
    .filter(|ip| !ip.is_empty())
    .map(str::to_owned)
}

// ─── Submit ──────────────────────────────────────────────────────────────────

/// `POST /submit-video`
///
/// Succeeds once the submission is durable, whether or not the follow-up
/// emails and notification went through.
pub async fn submit<S, M, A>(
  State(dispatcher): State<Arc<Dispatcher<S, M, A>>>,
  headers: HeaderMap,
  body: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: DashboardStore,
  M: MailTransport,
  A: ArtifactStore,
{
  let Json(payload) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let report = dispatcher.submit(payload, client_ip(&headers)).await?;
  tracing::info!(
    submission_id = %report.submission.submission_id,
    degraded = report.is_degraded(),
    "submission accepted"
  );
  Ok(Json(json!({ "message": "Submission successful" })))
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /submissions`
pub async fn list<S: DashboardStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<SubmissionRow>>, ApiError> {
  let rows = reports::submission_rows(store.as_ref())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rows))
}

/// `GET /submissions/:id`
pub async fn get_one<S: DashboardStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<SubmissionDetail>, ApiError> {
  let detail = reports::submission_detail(store.as_ref(), id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Submission not found".into()))?;
  Ok(Json(detail))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /submissions/:id`
pub async fn delete<S: DashboardStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  if !store.delete_submission(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound("Submission not found".into()));
  }
  tracing::info!(submission_id = %id, "submission deleted");
  Ok(Json(json!({ "message": "Submission deleted successfully" })))
}
