//! In-memory doubles for the core's collaborator traits.
//!
//! Available to this crate's tests and, behind the `testing` feature, to
//! downstream crates. The store and transport can be told to fail so the
//! dispatcher's partial-failure paths can be exercised.

use std::{
  sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  mail::{MailTransport, OutboundEmail},
  notification::{NewNotification, Notification},
  referrer::{Admin, AdminUpdate, Employee, EmployeeUpdate, FormLinks, NewAdmin, NewEmployee},
  signature::{ArtifactStore, SignatureImage, StoredArtifact},
  store::{DashboardStore, ReferrerCount, StoreError},
  submission::{
    Answer, Consent, Creator, NewSubmission, Submission, SubmissionPayload, VideoContent,
  },
};

/// One-pixel transparent PNG.
pub const SAMPLE_SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

// ─── Fixtures ────────────────────────────────────────────────────────────────

/// A complete, valid submission payload crediting `referrer_ref`.
pub fn sample_payload(referrer_ref: Option<&str>) -> SubmissionPayload {
  SubmissionPayload {
    referrer_ref:           referrer_ref.map(str::to_owned),
    title:                  Some("Cat on a skateboard".into()),
    description:            Some("Filmed at the park".into()),
    video_url:              Some("https://cdn.example.com/videos/cat.mp4".into()),
    raw_video_url:          Some("https://cdn.example.com/raw/cat.mp4".into()),
    first_name:             Some("Ana".into()),
    last_name:              Some("Silva".into()),
    social_handle:          Some("@ana".into()),
    country:                Some("PT".into()),
    email:                  Some("ana@example.com".into()),
    recorded_video:         Some(true),
    recorded_by:            Some("Me".into()),
    submitted_elsewhere:    Some(Answer::No),
    other_company_name:     None,
    not_uploaded_elsewhere: Some(true),
    agreed_18:              Some(true),
    agreed_terms:           Some(true),
    exclusive_rights:       Some(false),
    signature:              Some(SAMPLE_SIGNATURE.into()),
  }
}

/// A persisted-looking submission built from [`sample_payload`].
pub fn sample_submission(referrer_ref: Option<&str>) -> Submission {
  let now = Utc::now();
  let input = NewSubmission {
    referrer_ref:   referrer_ref.map(str::to_owned),
    creator:        Creator {
      first_name:    "Ana".into(),
      last_name:     "Silva".into(),
      email:         "ana@example.com".into(),
      country:       "PT".into(),
      social_handle: "@ana".into(),
    },
    content:        VideoContent {
      video_url:     "https://cdn.example.com/videos/cat.mp4".into(),
      raw_video_url: "https://cdn.example.com/raw/cat.mp4".into(),
      title:         Some("Cat on a skateboard".into()),
      description:   None,
    },
    consent:        Consent {
      recorded_video:         true,
      recorded_by:            "Me".into(),
      submitted_elsewhere:    Answer::No,
      other_company_name:     None,
      not_uploaded_elsewhere: true,
      agreed_18:              true,
      agreed_terms:           true,
      exclusive_rights:       false,
    },
    signature:      SAMPLE_SIGNATURE.into(),
    originating_ip: "203.0.113.9".into(),
  };
  stored(input, false, now)
}

fn stored(input: NewSubmission, is_admin_referrer: bool, now: chrono::DateTime<Utc>) -> Submission {
  Submission {
    submission_id: Uuid::new_v4(),
    referrer_ref: input.referrer_ref,
    is_admin_referrer,
    creator: input.creator,
    content: input.content,
    consent: input.consent,
    signature: input.signature,
    originating_ip: input.originating_ip,
    created_at: now,
    updated_at: now,
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error(transparent)]
  Core(#[from] crate::Error),

  #[error("injected {0} write failure")]
  Injected(&'static str),
}

impl StoreError for MemoryError {
  fn as_core(&self) -> Option<&crate::Error> {
    match self {
      Self::Core(e) => Some(e),
      Self::Injected(_) => None,
    }
  }
}

#[derive(Default)]
struct Inner {
  admins:        Vec<Admin>,
  employees:     Vec<Employee>,
  submissions:   Vec<Submission>,
  notifications: Vec<Notification>,
}

/// A [`DashboardStore`] held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
  inner:                    Mutex<Inner>,
  fail_submission_writes:   AtomicBool,
  fail_notification_writes: AtomicBool,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent `add_submission` fail.
  pub fn fail_submission_writes(&self, fail: bool) {
    self.fail_submission_writes.store(fail, Ordering::SeqCst);
  }

  /// Make every subsequent `add_notification` fail.
  pub fn fail_notification_writes(&self, fail: bool) {
    self.fail_notification_writes.store(fail, Ordering::SeqCst);
  }

  /// Insert an admin under a chosen identifier, bypassing email checks.
  /// Used to set up identifiers that exist in both collections.
  pub fn insert_admin_with_id(&self, id: Uuid, email: &str) -> Admin {
    let now = Utc::now();
    let admin = Admin {
      admin_id:      id,
      email:         email.to_owned(),
      display_name:  None,
      password_hash: String::new(),
      form_link:     String::new(),
      created_at:    now,
      updated_at:    now,
    };
    self.lock().admins.push(admin.clone());
    admin
  }

  /// Insert an employee under a chosen identifier, bypassing email checks.
  pub fn insert_employee_with_id(&self, id: Uuid, name: &str, email: &str) -> Employee {
    let now = Utc::now();
    let employee = Employee {
      employee_id: id,
      name:        name.to_owned(),
      email:       email.to_owned(),
      form_link:   String::new(),
      created_at:  now,
      updated_at:  now,
    };
    self.lock().employees.push(employee.clone());
    employee
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl DashboardStore for MemoryStore {
  type Error = MemoryError;

  // ── Admins ────────────────────────────────────────────────────────────

  async fn add_admin(&self, input: NewAdmin, links: &FormLinks) -> Result<Admin, MemoryError> {
    input.validate()?;
    let mut inner = self.lock();
    if inner.admins.iter().any(|a| a.email == input.email) {
      return Err(crate::Error::DuplicateEmail(input.email).into());
    }
    let now = Utc::now();
    let id = Uuid::new_v4();
    let admin = Admin {
      admin_id:      id,
      email:         input.email,
      display_name:  input.display_name,
      password_hash: input.password_hash,
      form_link:     links.link_for(id),
      created_at:    now,
      updated_at:    now,
    };
    inner.admins.push(admin.clone());
    Ok(admin)
  }

  async fn get_admin(&self, id: Uuid) -> Result<Option<Admin>, MemoryError> {
    Ok(self.lock().admins.iter().find(|a| a.admin_id == id).cloned())
  }

  async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, MemoryError> {
    Ok(self.lock().admins.iter().find(|a| a.email == email).cloned())
  }

  async fn list_admins(&self) -> Result<Vec<Admin>, MemoryError> {
    Ok(self.lock().admins.clone())
  }

  async fn update_admin(
    &self,
    id: Uuid,
    update: AdminUpdate,
  ) -> Result<Option<Admin>, MemoryError> {
    let mut inner = self.lock();
    if let Some(email) = &update.email {
      if inner.admins.iter().any(|a| a.admin_id != id && &a.email == email) {
        return Err(crate::Error::DuplicateEmail(email.clone()).into());
      }
    }
    let Some(admin) = inner.admins.iter_mut().find(|a| a.admin_id == id) else {
      return Ok(None);
    };
    if let Some(email) = update.email {
      admin.email = email;
    }
    if let Some(name) = update.display_name {
      admin.display_name = Some(name);
    }
    admin.updated_at = Utc::now();
    Ok(Some(admin.clone()))
  }

  async fn delete_admin(&self, id: Uuid) -> Result<bool, MemoryError> {
    let mut inner = self.lock();
    let before = inner.admins.len();
    inner.admins.retain(|a| a.admin_id != id);
    Ok(inner.admins.len() != before)
  }

  // ── Employees ─────────────────────────────────────────────────────────

  async fn add_employee(
    &self,
    input: NewEmployee,
    links: &FormLinks,
  ) -> Result<Employee, MemoryError> {
    input.validate()?;
    let mut inner = self.lock();
    if inner.employees.iter().any(|e| e.email == input.email) {
      return Err(crate::Error::DuplicateEmail(input.email).into());
    }
    let now = Utc::now();
    let id = Uuid::new_v4();
    let employee = Employee {
      employee_id: id,
      name:        input.name,
      email:       input.email,
      form_link:   links.link_for(id),
      created_at:  now,
      updated_at:  now,
    };
    inner.employees.push(employee.clone());
    Ok(employee)
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<Employee>, MemoryError> {
    Ok(self.lock().employees.iter().find(|e| e.employee_id == id).cloned())
  }

  async fn list_employees(&self) -> Result<Vec<Employee>, MemoryError> {
    Ok(self.lock().employees.clone())
  }

  async fn update_employee(
    &self,
    id: Uuid,
    update: EmployeeUpdate,
  ) -> Result<Option<Employee>, MemoryError> {
    update.validate()?;
    let mut inner = self.lock();
    if let Some(email) = &update.email {
      if inner.employees.iter().any(|e| e.employee_id != id && &e.email == email) {
        return Err(crate::Error::DuplicateEmail(email.clone()).into());
      }
    }
    let Some(employee) = inner.employees.iter_mut().find(|e| e.employee_id == id) else {
      return Ok(None);
    };
    if let Some(name) = update.name {
      employee.name = name;
    }
    if let Some(email) = update.email {
      employee.email = email;
    }
    employee.updated_at = Utc::now();
    Ok(Some(employee.clone()))
  }

  async fn delete_employee(&self, id: Uuid) -> Result<bool, MemoryError> {
    let mut inner = self.lock();
    let before = inner.employees.len();
    inner.employees.retain(|e| e.employee_id != id);
    Ok(inner.employees.len() != before)
  }

  async fn count_employees(&self) -> Result<u64, MemoryError> {
    Ok(self.lock().employees.len() as u64)
  }

  // ── Submissions ───────────────────────────────────────────────────────

  async fn add_submission(
    &self,
    input: NewSubmission,
    is_admin_referrer: bool,
  ) -> Result<Submission, MemoryError> {
    if self.fail_submission_writes.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected("submission"));
    }
    let submission = stored(input, is_admin_referrer, Utc::now());
    self.lock().submissions.push(submission.clone());
    Ok(submission)
  }

  async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, MemoryError> {
    Ok(
      self
        .lock()
        .submissions
        .iter()
        .find(|s| s.submission_id == id)
        .cloned(),
    )
  }

  async fn list_submissions(&self) -> Result<Vec<Submission>, MemoryError> {
    Ok(self.lock().submissions.clone())
  }

  async fn submissions_for_employee(
    &self,
    employee_id: Uuid,
  ) -> Result<Vec<Submission>, MemoryError> {
    let reference = employee_id.hyphenated().to_string();
    Ok(
      self
        .lock()
        .submissions
        .iter()
        .filter(|s| !s.is_admin_referrer && s.referrer_ref.as_deref() == Some(&reference))
        .cloned()
        .collect(),
    )
  }

  async fn delete_submission(&self, id: Uuid) -> Result<bool, MemoryError> {
    let mut inner = self.lock();
    let before = inner.submissions.len();
    inner.submissions.retain(|s| s.submission_id != id);
    Ok(inner.submissions.len() != before)
  }

  async fn count_submissions(&self) -> Result<u64, MemoryError> {
    Ok(self.lock().submissions.len() as u64)
  }

  async fn referrer_counts(&self) -> Result<Vec<ReferrerCount>, MemoryError> {
    let inner = self.lock();
    let mut counts: Vec<ReferrerCount> = Vec::new();
    for reference in inner
      .submissions
      .iter()
      .filter_map(|s| s.referrer_ref.as_deref())
      .filter(|r| !r.is_empty())
    {
      match counts.iter_mut().find(|c| c.referrer_ref == reference) {
        Some(count) => count.total += 1,
        None => counts.push(ReferrerCount { referrer_ref: reference.to_owned(), total: 1 }),
      }
    }
    counts.sort_by(|a, b| {
      b.total
        .cmp(&a.total)
        .then_with(|| a.referrer_ref.cmp(&b.referrer_ref))
    });
    Ok(counts)
  }

  // ── Notifications ─────────────────────────────────────────────────────

  async fn add_notification(
    &self,
    input: NewNotification,
  ) -> Result<Notification, MemoryError> {
    if self.fail_notification_writes.load(Ordering::SeqCst) {
      return Err(MemoryError::Injected("notification"));
    }
    let notification = Notification {
      notification_id:   Uuid::new_v4(),
      creator_name:      input.creator_name,
      employee_name:     input.employee_name,
      is_admin_referrer: input.is_admin_referrer,
      submission_id:     input.submission_id,
      message:           input.message,
      created_at:        Utc::now(),
    };
    self.lock().notifications.push(notification.clone());
    Ok(notification)
  }

  async fn list_notifications(&self) -> Result<Vec<Notification>, MemoryError> {
    let mut all = self.lock().notifications.clone();
    all.reverse();
    Ok(all)
  }

  async fn delete_notification(&self, id: Uuid) -> Result<bool, MemoryError> {
    let mut inner = self.lock();
    let before = inner.notifications.len();
    inner.notifications.retain(|n| n.notification_id != id);
    Ok(inner.notifications.len() != before)
  }
}

// ─── Mail ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("mail transport unavailable")]
pub struct TransportDown;

/// How a [`RecordingTransport`] answers `send`.
#[derive(Debug, Clone, Copy, Default)]
pub enum TransportMode {
  #[default]
  Deliver,
  Fail,
  /// Sleep before delivering; used to trip the dispatcher's timeout.
  Stall(Duration),
}

/// A [`MailTransport`] that keeps every delivered email.
#[derive(Default)]
pub struct RecordingTransport {
  mode: Mutex<TransportMode>,
  sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingTransport {
  pub fn new(mode: TransportMode) -> Self {
    Self { mode: Mutex::new(mode), sent: Mutex::default() }
  }

  pub fn set_mode(&self, mode: TransportMode) {
    *self.mode.lock().unwrap_or_else(PoisonError::into_inner) = mode;
  }

  /// Emails delivered so far, in order.
  pub fn sent(&self) -> Vec<OutboundEmail> {
    self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl MailTransport for RecordingTransport {
  type Error = TransportDown;

  async fn send(&self, email: &OutboundEmail) -> Result<(), TransportDown> {
    let mode = *self.mode.lock().unwrap_or_else(PoisonError::into_inner);
    match mode {
      TransportMode::Deliver => {}
      TransportMode::Fail => return Err(TransportDown),
      TransportMode::Stall(delay) => tokio::time::sleep(delay).await,
    }
    self
      .sent
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(email.clone());
    Ok(())
  }
}

// ─── Artifacts ───────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
#[error("artifact sink unavailable")]
pub struct ArtifactsDown;

/// An [`ArtifactStore`] that keeps artifacts in a map-like list.
#[derive(Default)]
pub struct MemoryArtifacts {
  fail:   AtomicBool,
  stored: Mutex<Vec<(String, SignatureImage)>>,
}

impl MemoryArtifacts {
  pub fn new() -> Self { Self::default() }

  pub fn fail_writes(&self, fail: bool) { self.fail.store(fail, Ordering::SeqCst); }

  /// Names of stored artifacts, in order.
  pub fn names(&self) -> Vec<String> {
    self
      .stored
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .iter()
      .map(|(name, _)| name.clone())
      .collect()
  }
}

impl ArtifactStore for MemoryArtifacts {
  type Error = ArtifactsDown;

  async fn put(&self, name: &str, image: &SignatureImage) -> Result<StoredArtifact, ArtifactsDown> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(ArtifactsDown);
    }
    self
      .stored
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push((name.to_owned(), image.clone()));
    Ok(StoredArtifact { name: name.to_owned(), location: format!("memory://{name}") })
  }
}
