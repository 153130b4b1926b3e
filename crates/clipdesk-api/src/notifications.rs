//! Handlers for `/notifications` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use clipdesk_core::{notification::Notification, store::DashboardStore};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /notifications`, most recent first.
pub async fn list<S: DashboardStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Notification>>, ApiError> {
  let notifications = store.list_notifications().await.map_err(ApiError::store)?;
  Ok(Json(notifications))
}

/// `DELETE /notifications/:id`
pub async fn delete<S: DashboardStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  if !store.delete_notification(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound("Notification not found".into()));
  }
  Ok(Json(json!({ "message": "Notification deleted successfully" })))
}
