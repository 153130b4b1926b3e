//! The `DashboardStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `clipdesk-store-sqlite`).
//! Higher layers (`clipdesk-api`, `clipdesk-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  notification::{NewNotification, Notification},
  referrer::{Admin, AdminUpdate, Employee, EmployeeUpdate, FormLinks, NewAdmin, NewEmployee},
  submission::{NewSubmission, Submission},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Bound on backend errors.
///
/// Backends wrap domain rejections (duplicate emails, missing fields) in their
/// own error type; `as_core` lets the HTTP layer recover them and pick a
/// status code without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Number of submissions carrying a given referrer reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferrerCount {
  pub referrer_ref: String,
  pub total:        u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a clipdesk storage backend.
///
/// Admins and employees live in separate collections but share one identifier
/// space. Backends do not enforce referential integrity between submissions,
/// notifications and referrers: a submission keeps its `referrer_ref` after
/// the referrer is deleted, and a notification outlives its submission.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DashboardStore: Send + Sync {
  type Error: StoreError;

  // ── Admins ────────────────────────────────────────────────────────────

  /// Persist a new admin, assigning its identifier and form link.
  ///
  /// Fails with [`crate::Error::DuplicateEmail`] if the email is taken.
  fn add_admin<'a>(
    &'a self,
    input: NewAdmin,
    links: &'a FormLinks,
  ) -> impl Future<Output = Result<Admin, Self::Error>> + Send + 'a;

  fn get_admin(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + '_;

  /// Case-sensitive exact match on the stored email.
  fn find_admin_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + 'a;

  /// All admins in creation order.
  fn list_admins(
    &self,
  ) -> impl Future<Output = Result<Vec<Admin>, Self::Error>> + Send + '_;

  /// Apply a partial update. Returns `None` if no admin has this id.
  fn update_admin(
    &self,
    id: Uuid,
    update: AdminUpdate,
  ) -> impl Future<Output = Result<Option<Admin>, Self::Error>> + Send + '_;

  /// Returns `false` if no admin had this id.
  fn delete_admin(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Employees ─────────────────────────────────────────────────────────

  fn add_employee<'a>(
    &'a self,
    input: NewEmployee,
    links: &'a FormLinks,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + 'a;

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  /// All employees in creation order.
  fn list_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  fn update_employee(
    &self,
    id: Uuid,
    update: EmployeeUpdate,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  /// Deleting an employee leaves their submissions in place.
  fn delete_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn count_employees(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Persist a validated submission with the attribution flag decided by
  /// the caller. The flag is stored as given and never recomputed.
  fn add_submission(
    &self,
    input: NewSubmission,
    is_admin_referrer: bool,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  fn get_submission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  /// All submissions in insertion order.
  fn list_submissions(
    &self,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  /// Submissions whose reference equals the employee's canonical id and that
  /// were not attributed to an admin.
  fn submissions_for_employee(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  fn delete_submission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn count_submissions(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Submission totals grouped by `referrer_ref`, highest first. Submissions
  /// without a reference are excluded. Equal totals are ordered by reference.
  fn referrer_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<ReferrerCount>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn add_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// All notifications, most recent first.
  fn list_notifications(
    &self,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  fn delete_notification(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
