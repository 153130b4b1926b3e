//! Pre-signed direct uploads of submission videos to an S3-compatible
//! (Cloudflare R2) bucket.

use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
  Client,
  config::{Credentials, Region},
  presigning::PresigningConfig,
};
use axum::{Json, extract::State};
use clipdesk_core::store::DashboardStore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::Error};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

fn default_expires_secs() -> u64 { 300 }

/// `[uploads]` table of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
  pub account_id:        String,
  pub access_key_id:     String,
  pub secret_access_key: String,
  pub bucket:            String,
  #[serde(default = "default_expires_secs")]
  pub expires_secs:      u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
  pub upload_url: String,
  pub public_url: String,
}

pub struct Uploads {
  client:     Client,
  bucket:     String,
  account_id: String,
  expires:    Duration,
}

impl Uploads {
  pub fn new(config: &UploadConfig) -> Self {
    let credentials = Credentials::new(
      &config.access_key_id,
      &config.secret_access_key,
      None,
      None,
      "clipdesk-config",
    );
    let s3_config = aws_sdk_s3::Config::builder()
      .behavior_version(BehaviorVersion::latest())
      .region(Region::new("auto"))
      .endpoint_url(format!("https://{}.r2.cloudflarestorage.com", config.account_id))
      .credentials_provider(credentials)
      .force_path_style(true)
      .build();

    Self {
      client:     Client::from_conf(s3_config),
      bucket:     config.bucket.clone(),
      account_id: config.account_id.clone(),
      expires:    Duration::from_secs(config.expires_secs),
    }
  }

  /// Where an uploaded object can be fetched from once the client has PUT it.
  pub fn public_url(&self, key: &str) -> String {
    format!("https://pub-{}.r2.dev/{key}", self.account_id)
  }

  /// Presign a `PUT` for a fresh `videos/<uuid>.mp4` key.
  pub async fn presign(&self) -> Result<PresignedUpload, Error> {
    let key = format!("videos/{}.mp4", Uuid::new_v4());
    let presigning =
      PresigningConfig::expires_in(self.expires).map_err(|e| Error::Upload(e.to_string()))?;
    let request = self
      .client
      .put_object()
      .bucket(&self.bucket)
      .key(&key)
      .content_type(VIDEO_CONTENT_TYPE)
      .presigned(presigning)
      .await
      .map_err(|e| Error::Upload(e.to_string()))?;

    Ok(PresignedUpload {
      upload_url: request.uri().to_string(),
      public_url: self.public_url(&key),
    })
  }
}

/// `GET /upload-url`
pub async fn upload_url<S: DashboardStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<PresignedUpload>, Error> {
  let uploads = state.uploads.as_ref().ok_or(Error::UploadsDisabled)?;
  let presigned = uploads.presign().await?;
  tracing::debug!(public_url = %presigned.public_url, "presigned video upload");
  Ok(Json(presigned))
}
