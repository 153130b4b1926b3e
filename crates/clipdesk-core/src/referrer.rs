//! Referrer Directory records: the admins and employees a submitter may
//! credit with a referral.
//!
//! Both collections draw identifiers from the same UUID space, but nothing
//! forces the two sets apart; which collection holds an identifier is the
//! only thing that distinguishes an admin from an employee. Telling them apart
//! is the job of [`crate::attribution`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Label shown for an admin who has no display name.
pub const DEFAULT_ADMIN_LABEL: &str = "Admin";

// ─── Form links ──────────────────────────────────────────────────────────────

/// Derives the public submission-form URL handed out to a referrer.
///
/// The link embeds the referrer's identifier, so it can only be computed once
/// the store has assigned one; it never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLinks {
  base: String,
}

impl FormLinks {
  pub fn new(base: impl Into<String>) -> Self {
    let base = base.into();
    Self { base: base.trim_end_matches('/').to_owned() }
  }

  pub fn link_for(&self, id: Uuid) -> String {
    format!("{}/{}", self.base, id.hyphenated())
  }
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// An operator account. Admins can log in and may also act as referrers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
  #[serde(rename = "id")]
  pub admin_id:      Uuid,
  pub email:         String,
  pub display_name:  Option<String>,
  /// argon2 PHC string; never serialised.
  #[serde(skip)]
  pub password_hash: String,
  pub form_link:     String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Admin {
  /// The display name, or [`DEFAULT_ADMIN_LABEL`] when none was given.
  pub fn label(&self) -> &str {
    self
      .display_name
      .as_deref()
      .filter(|n| !n.trim().is_empty())
      .unwrap_or(DEFAULT_ADMIN_LABEL)
  }
}

/// Input to [`crate::store::DashboardStore::add_admin`].
#[derive(Debug, Clone)]
pub struct NewAdmin {
  pub email:         String,
  pub password_hash: String,
  pub display_name:  Option<String>,
}

impl NewAdmin {
  /// Reject an admin without an email or password hash.
  pub fn validate(&self) -> Result<()> {
    let mut missing = Vec::new();
    if self.email.trim().is_empty() {
      missing.push("email");
    }
    if self.password_hash.is_empty() {
      missing.push("password");
    }
    if missing.is_empty() { Ok(()) } else { Err(Error::Validation(missing)) }
  }
}

/// Partial update for an admin; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdate {
  pub email:        Option<String>,
  pub display_name: Option<String>,
}

// ─── Employee ────────────────────────────────────────────────────────────────

/// A staff member who distributes their form link to creators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  #[serde(rename = "id")]
  pub employee_id: Uuid,
  pub name:        String,
  pub email:       String,
  pub form_link:   String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::DashboardStore::add_employee`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
  #[serde(default)]
  pub name:  String,
  #[serde(default)]
  pub email: String,
}

impl NewEmployee {
  /// Reject an employee without a name or email.
  pub fn validate(&self) -> Result<()> {
    let mut missing = Vec::new();
    if self.name.trim().is_empty() {
      missing.push("name");
    }
    if self.email.trim().is_empty() {
      missing.push("email");
    }
    if missing.is_empty() { Ok(()) } else { Err(Error::Validation(missing)) }
  }
}

/// Partial update for an employee; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeUpdate {
  pub name:  Option<String>,
  pub email: Option<String>,
}

impl EmployeeUpdate {
  /// Blank values are rejected rather than stored.
  pub fn validate(&self) -> Result<()> {
    let mut missing = Vec::new();
    if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
      missing.push("name");
    }
    if self.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
      missing.push("email");
    }
    if missing.is_empty() { Ok(()) } else { Err(Error::Validation(missing)) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn form_link_embeds_canonical_id() {
    let links = FormLinks::new("https://example.com/submit-video/");
    let id = Uuid::new_v4();
    assert_eq!(
      links.link_for(id),
      format!("https://example.com/submit-video/{}", id.hyphenated())
    );
  }

  #[test]
  fn new_employee_requires_name_and_email() {
    let input = NewEmployee { name: " ".into(), email: String::new() };
    match input.validate() {
      Err(Error::Validation(fields)) => assert_eq!(fields, ["name", "email"]),
      other => panic!("expected validation error, got {other:?}"),
    }
  }

  #[test]
  fn admin_label_falls_back_to_default() {
    let now = Utc::now();
    let mut admin = Admin {
      admin_id:      Uuid::new_v4(),
      email:         "ops@example.com".into(),
      display_name:  None,
      password_hash: "x".into(),
      form_link:     String::new(),
      created_at:    now,
      updated_at:    now,
    };
    assert_eq!(admin.label(), DEFAULT_ADMIN_LABEL);
    admin.display_name = Some("Dana".into());
    assert_eq!(admin.label(), "Dana");
  }
}
