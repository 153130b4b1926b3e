//! Video submissions: the raw payload posted by the public form, its
//! validated form, and the persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Stored when the caller's address could not be determined.
pub const UNKNOWN_IP: &str = "Unknown";

// ─── Field groups ────────────────────────────────────────────────────────────

/// A yes/no answer the form collects as text rather than a checkbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
  Yes,
  #[default]
  No,
}

impl Answer {
  pub fn is_yes(self) -> bool { self == Self::Yes }
}

/// Who made the video and how to reach them. Not validated beyond presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub country:       String,
  pub social_handle: String,
}

impl Creator {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoContent {
  #[serde(rename = "videoURL")]
  pub video_url:     String,
  #[serde(rename = "rawVideoURL")]
  pub raw_video_url: String,
  pub title:         Option<String>,
  pub description:   Option<String>,
}

/// Consent answers, collected client-side and stored exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
  pub recorded_video:         bool,
  pub recorded_by:            String,
  pub submitted_elsewhere:    Answer,
  pub other_company_name:     Option<String>,
  pub not_uploaded_elsewhere: bool,
  #[serde(rename = "agreed18")]
  pub agreed_18:              bool,
  pub agreed_terms:           bool,
  pub exclusive_rights:       bool,
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// The body of a public submission, before validation. Every field is
/// optional here so that absence can be reported as a validation failure
/// rather than a decoding failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
  #[serde(alias = "empRef")]
  pub referrer_ref:           Option<String>,
  pub title:                  Option<String>,
  pub description:            Option<String>,
  #[serde(rename = "videoURL")]
  pub video_url:              Option<String>,
  #[serde(rename = "rawVideoURL", alias = "rawVideo")]
  pub raw_video_url:          Option<String>,
  pub first_name:             Option<String>,
  pub last_name:              Option<String>,
  pub social_handle:          Option<String>,
  pub country:                Option<String>,
  pub email:                  Option<String>,
  pub recorded_video:         Option<bool>,
  pub recorded_by:            Option<String>,
  pub submitted_elsewhere:    Option<Answer>,
  pub other_company_name:     Option<String>,
  pub not_uploaded_elsewhere: Option<bool>,
  #[serde(rename = "agreed18")]
  pub agreed_18:              Option<bool>,
  pub agreed_terms:           Option<bool>,
  pub exclusive_rights:       Option<bool>,
  /// Base64 data URL of the drawn signature.
  pub signature:              Option<String>,
}

impl SubmissionPayload {
  /// Check every mandatory field is present, collecting all the missing ones
  /// into a single [`Error::Validation`].
  pub fn validate(self, originating_ip: Option<String>) -> Result<NewSubmission> {
    let mut missing = Vec::new();

    let creator = Creator {
      first_name:    text(self.first_name, "firstName", &mut missing),
      last_name:     text(self.last_name, "lastName", &mut missing),
      email:         text(self.email, "email", &mut missing),
      country:       text(self.country, "country", &mut missing),
      social_handle: text(self.social_handle, "socialHandle", &mut missing),
    };

    let content = VideoContent {
      video_url:     text(self.video_url, "videoURL", &mut missing),
      raw_video_url: text(self.raw_video_url, "rawVideoURL", &mut missing),
      title:         self.title,
      description:   self.description,
    };

    let consent = Consent {
      recorded_video:         present(self.recorded_video, "recordedVideo", &mut missing),
      recorded_by:            text(self.recorded_by, "recordedBy", &mut missing),
      submitted_elsewhere:    present(self.submitted_elsewhere, "submittedElsewhere", &mut missing),
      other_company_name:     self.other_company_name,
      not_uploaded_elsewhere: present(
        self.not_uploaded_elsewhere,
        "notUploadedElsewhere",
        &mut missing,
      ),
      agreed_18:              present(self.agreed_18, "agreed18", &mut missing),
      agreed_terms:           present(self.agreed_terms, "agreedTerms", &mut missing),
      exclusive_rights:       present(self.exclusive_rights, "exclusiveRights", &mut missing),
    };

    let signature = text(self.signature, "signature", &mut missing);

    if !missing.is_empty() {
      return Err(Error::Validation(missing));
    }

    Ok(NewSubmission {
      referrer_ref: self.referrer_ref,
      creator,
      content,
      consent,
      signature,
      originating_ip: originating_ip
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| UNKNOWN_IP.to_owned()),
    })
  }
}

fn text(value: Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> String {
  match value {
    Some(v) if !v.trim().is_empty() => v,
    _ => {
      missing.push(field);
      String::new()
    }
  }
}

fn present<T: Default>(value: Option<T>, field: &'static str, missing: &mut Vec<&'static str>) -> T {
  value.unwrap_or_else(|| {
    missing.push(field);
    T::default()
  })
}

// ─── NewSubmission ───────────────────────────────────────────────────────────

/// A validated submission, ready for [`crate::store::DashboardStore::add_submission`].
/// `referrer_ref` is kept verbatim even when it matches no referrer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
  pub referrer_ref:   Option<String>,
  pub creator:        Creator,
  pub content:        VideoContent,
  pub consent:        Consent,
  pub signature:      String,
  pub originating_ip: String,
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A persisted submission.
///
/// `is_admin_referrer` records the attribution decision made when the
/// submission arrived. It is never recomputed, even if the referrer is later
/// deleted or recreated under a different collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  #[serde(rename = "id")]
  pub submission_id:     Uuid,
  pub referrer_ref:      Option<String>,
  pub is_admin_referrer: bool,
  #[serde(flatten)]
  pub creator:           Creator,
  #[serde(flatten)]
  pub content:           VideoContent,
  #[serde(flatten)]
  pub consent:           Consent,
  pub signature:         String,
  #[serde(rename = "userIp")]
  pub originating_ip:    String,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}
