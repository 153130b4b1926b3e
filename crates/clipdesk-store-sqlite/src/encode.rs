//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings, the same form a referrer's form link carries,
//! so a submission's raw `referrer_ref` can be compared against them directly.
//! Consent answers are stored as compact JSON.

use chrono::{DateTime, Utc};
use clipdesk_core::{
  notification::Notification,
  referrer::{Admin, Employee},
  submission::{Consent, Creator, Submission, VideoContent},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Consent ─────────────────────────────────────────────────────────────────

pub fn encode_consent(c: &Consent) -> Result<String> { Ok(serde_json::to_string(c)?) }

pub fn decode_consent(s: &str) -> Result<Consent> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ADMIN_COLUMNS: &str =
  "admin_id, email, display_name, password_hash, form_link, created_at, updated_at";

/// Raw strings read directly from an `admins` row.
pub struct RawAdmin {
  pub admin_id:      String,
  pub email:         String,
  pub display_name:  Option<String>,
  pub password_hash: String,
  pub form_link:     String,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawAdmin {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      admin_id:      row.get(0)?,
      email:         row.get(1)?,
      display_name:  row.get(2)?,
      password_hash: row.get(3)?,
      form_link:     row.get(4)?,
      created_at:    row.get(5)?,
      updated_at:    row.get(6)?,
    })
  }

  pub fn into_admin(self) -> Result<Admin> {
    Ok(Admin {
      admin_id:      decode_uuid(&self.admin_id)?,
      email:         self.email,
      display_name:  self.display_name,
      password_hash: self.password_hash,
      form_link:     self.form_link,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const EMPLOYEE_COLUMNS: &str =
  "employee_id, name, email, form_link, created_at, updated_at";

/// Raw strings read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id: String,
  pub name:        String,
  pub email:       String,
  pub form_link:   String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawEmployee {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id: row.get(0)?,
      name:        row.get(1)?,
      email:       row.get(2)?,
      form_link:   row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id: decode_uuid(&self.employee_id)?,
      name:        self.name,
      email:       self.email,
      form_link:   self.form_link,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const SUBMISSION_COLUMNS: &str = "submission_id, referrer_ref, is_admin_referrer,
   first_name, last_name, email, country, social_handle,
   video_url, raw_video_url, title, description,
   consent, signature, originating_ip, created_at, updated_at";

/// Raw values read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id:     String,
  pub referrer_ref:      Option<String>,
  pub is_admin_referrer: bool,
  pub first_name:        String,
  pub last_name:         String,
  pub email:             String,
  pub country:           String,
  pub social_handle:     String,
  pub video_url:         String,
  pub raw_video_url:     String,
  pub title:             Option<String>,
  pub description:       Option<String>,
  pub consent:           String,
  pub signature:         String,
  pub originating_ip:    String,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawSubmission {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id:     row.get(0)?,
      referrer_ref:      row.get(1)?,
      is_admin_referrer: row.get(2)?,
      first_name:        row.get(3)?,
      last_name:         row.get(4)?,
      email:             row.get(5)?,
      country:           row.get(6)?,
      social_handle:     row.get(7)?,
      video_url:         row.get(8)?,
      raw_video_url:     row.get(9)?,
      title:             row.get(10)?,
      description:       row.get(11)?,
      consent:           row.get(12)?,
      signature:         row.get(13)?,
      originating_ip:    row.get(14)?,
      created_at:        row.get(15)?,
      updated_at:        row.get(16)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id:     decode_uuid(&self.submission_id)?,
      referrer_ref:      self.referrer_ref,
      is_admin_referrer: self.is_admin_referrer,
      creator:           Creator {
        first_name:    self.first_name,
        last_name:     self.last_name,
        email:         self.email,
        country:       self.country,
        social_handle: self.social_handle,
      },
      content:           VideoContent {
        video_url:     self.video_url,
        raw_video_url: self.raw_video_url,
        title:         self.title,
        description:   self.description,
      },
      consent:           decode_consent(&self.consent)?,
      signature:         self.signature,
      originating_ip:    self.originating_ip,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str = "notification_id, creator_name, employee_name,
   is_admin_referrer, submission_id, message, created_at";

/// Raw values read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id:   String,
  pub creator_name:      String,
  pub employee_name:     String,
  pub is_admin_referrer: bool,
  pub submission_id:     String,
  pub message:           String,
  pub created_at:        String,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id:   row.get(0)?,
      creator_name:      row.get(1)?,
      employee_name:     row.get(2)?,
      is_admin_referrer: row.get(3)?,
      submission_id:     row.get(4)?,
      message:           row.get(5)?,
      created_at:        row.get(6)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id:   decode_uuid(&self.notification_id)?,
      creator_name:      self.creator_name,
      employee_name:     self.employee_name,
      is_admin_referrer: self.is_admin_referrer,
      submission_id:     decode_uuid(&self.submission_id)?,
      message:           self.message,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}
