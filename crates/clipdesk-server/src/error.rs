//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use clipdesk_api::ApiError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing, malformed, or expired session token.
  #[error("unauthorized")]
  Unauthorized,
  #[error("invalid credentials")]
  InvalidCredentials,
  /// The request's `Origin` is not on the allow list.
  #[error("forbidden")]
  Forbidden,
  #[error("uploads are not configured")]
  UploadsDisabled,
  #[error("could not presign upload: {0}")]
  Upload(String),
  #[error("token error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),
  #[error("password hashing failed: {0}")]
  Hash(String),
  #[error(transparent)]
  Api(#[from] ApiError),
}

fn body(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res = body(StatusCode::UNAUTHORIZED, "Unauthorized");
        res
          .headers_mut()
          .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        res
      }
      Error::InvalidCredentials => body(StatusCode::UNAUTHORIZED, "Invalid credentials"),
      Error::Forbidden => body(StatusCode::FORBIDDEN, "Forbidden"),
      Error::UploadsDisabled => {
        body(StatusCode::SERVICE_UNAVAILABLE, "Video uploads are not configured")
      }
      Error::Upload(msg) => {
        tracing::error!(error = %msg, "failed to presign upload");
        body(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate upload URL")
      }
      e @ (Error::Token(_) | Error::Hash(_)) => {
        tracing::error!(error = %e, "auth failure");
        body(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
      }
      Error::Api(e) => e.into_response(),
    }
  }
}
