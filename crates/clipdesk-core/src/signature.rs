//! Decoding the drawn signature and persisting it as an artifact.

use std::future::Future;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use uuid::Uuid;

use crate::{Error, Result};

const DEFAULT_MEDIA_TYPE: &str = "image/png";

/// A signature image decoded from its `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureImage {
  pub media_type: String,
  pub bytes:      Bytes,
}

impl SignatureImage {
  /// Decode a `data:<media-type>;base64,<payload>` URL.
  ///
  /// An empty media type defaults to `image/png`; anything other than an
  /// `image/*` type is rejected.
  pub fn decode(data_url: &str) -> Result<Self> {
    let rest = data_url
      .trim()
      .strip_prefix("data:")
      .ok_or(Error::InvalidSignature)?;
    let (header, payload) = rest.split_once(',').ok_or(Error::InvalidSignature)?;
    let media_type = header
      .strip_suffix(";base64")
      .ok_or(Error::InvalidSignature)?;
    let media_type = if media_type.is_empty() {
      DEFAULT_MEDIA_TYPE
    } else {
      media_type
    };
    if !media_type.starts_with("image/") {
      return Err(Error::InvalidSignature);
    }

    let bytes = STANDARD.decode(payload.trim())?;
    Ok(Self { media_type: media_type.to_owned(), bytes: Bytes::from(bytes) })
  }

  /// File extension derived from the media subtype, e.g. `png`. Anything
  /// but a plain alphanumeric subtype falls back to `png`.
  pub fn extension(&self) -> &str {
    self
      .media_type
      .split_once('/')
      .map(|(_, sub)| sub.split('+').next().unwrap_or(sub))
      .filter(|sub| !sub.is_empty() && sub.bytes().all(|b| b.is_ascii_alphanumeric()))
      .unwrap_or("png")
  }

  /// Name of the stored artifact for a submission: `signature_<id>.<ext>`.
  pub fn artifact_name(&self, submission_id: Uuid) -> String {
    format!("signature_{}.{}", submission_id.hyphenated(), self.extension())
  }
}

/// Where an artifact ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
  pub name:     String,
  /// Backend-specific location, e.g. a filesystem path.
  pub location: String,
}

/// Durable storage for signature images.
pub trait ArtifactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn put<'a>(
    &'a self,
    name: &'a str,
    image: &'a SignatureImage,
  ) -> impl Future<Output = Result<StoredArtifact, Self::Error>> + Send + 'a;
}
