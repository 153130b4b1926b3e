//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use clipdesk_core::{dispatch::DispatchError, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Mandatory fields were missing or blank.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing domain rejections as client errors.
  pub fn store<E: StoreError>(e: E) -> Self {
    let rejected = match e.as_core() {
      Some(clipdesk_core::Error::DuplicateEmail(email)) => {
        Some(Self::Conflict(format!("email address already registered: {email}")))
      }
      Some(core @ clipdesk_core::Error::Validation(_)) => Some(Self::Validation(core.to_string())),
      _ => None,
    };
    rejected.unwrap_or_else(|| Self::Store(Box::new(e)))
  }
}

impl From<DispatchError> for ApiError {
  fn from(e: DispatchError) -> Self {
    match e {
      DispatchError::Validation(e) => Self::Validation(e.to_string()),
      DispatchError::Store(e) => Self::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
