//! Error types for `clipdesk-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// One or more mandatory fields were absent or blank.
  #[error("missing required fields: {}", .0.join(", "))]
  Validation(Vec<&'static str>),

  #[error("email address already registered: {0}")]
  DuplicateEmail(String),

  #[error("signature payload is not a base64 data URL")]
  InvalidSignature,

  #[error("signature payload is not valid base64: {0}")]
  SignatureEncoding(#[from] base64::DecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
