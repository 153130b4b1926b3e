//! Outbound mail transports.
//!
//! `http` posts each message as JSON to a transactional-mail API
//! authenticated with a bearer key; inline images travel base64-encoded with
//! their content id. `log` only writes the envelope to the trace output and is
//! meant for local development.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use clipdesk_core::mail::{MailTransport, OutboundEmail};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

fn default_timeout_secs() -> u64 { 10 }

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
  Http,
  #[default]
  Log,
}

/// `[mail]` table of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
  #[serde(default)]
  pub transport:    TransportKind,
  /// Send endpoint of the mail API; required for `http`.
  pub endpoint:     Option<String>,
  /// Bearer key for the mail API; required for `http`.
  pub api_key:      Option<String>,
  /// `From` address on every message.
  pub sender:       String,
  /// Upper bound on a single send.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum MailError {
  #[error("mail configuration: {0}")]
  Config(&'static str),
  #[error("mail request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("mail API rejected message ({status}): {body}")]
  Rejected { status: u16, body: String },
}

pub struct HttpMailer {
  client:   reqwest::Client,
  endpoint: String,
  api_key:  String,
}

pub enum Mailer {
  Http(HttpMailer),
  Log,
}

impl Mailer {
  pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
    match config.transport {
      TransportKind::Log => Ok(Self::Log),
      TransportKind::Http => {
        let endpoint = config
          .endpoint
          .clone()
          .ok_or(MailError::Config("mail.endpoint is required for the http transport"))?;
        let api_key = config
          .api_key
          .clone()
          .ok_or(MailError::Config("mail.api_key is required for the http transport"))?;
        let client = reqwest::Client::builder()
          .timeout(Duration::from_secs(config.timeout_secs))
          .build()?;
        Ok(Self::Http(HttpMailer { client, endpoint, api_key }))
      }
    }
  }
}

/// JSON body posted by the `http` transport.
pub fn request_body(email: &OutboundEmail) -> Value {
  let attachments: Vec<Value> = email
    .inline
    .iter()
    .map(|image| {
      json!({
        "filename":     image.file_name,
        "content":      B64.encode(&image.bytes),
        "content_type": image.media_type,
        "content_id":   image.content_id,
        "disposition":  "inline",
      })
    })
    .collect();

  json!({
    "from":        email.from,
    "to":          [email.to],
    "subject":     email.subject,
    "html":        email.html,
    "attachments": attachments,
  })
}

impl MailTransport for Mailer {
  type Error = MailError;

  async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
    match self {
      Mailer::Log => {
        tracing::info!(
          to = %email.to,
          subject = %email.subject,
          inline = email.inline.len(),
          "email not sent: log transport"
        );
        Ok(())
      }
      Mailer::Http(http) => {
        let response = http
          .client
          .post(&http.endpoint)
          .bearer_auth(&http.api_key)
          .json(&request_body(email))
          .send()
          .await?;
        let status = response.status();
        if status.is_success() {
          tracing::debug!(to = %email.to, subject = %email.subject, "email sent");
          return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected { status: status.as_u16(), body })
      }
    }
  }
}
