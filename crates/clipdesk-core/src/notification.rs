//! Dashboard notifications and the emitter that derives them from a freshly
//! persisted submission.
//!
//! Notifications deliberately copy the creator's name and the referrer's label
//! instead of pointing at those records. They are a snapshot of what was true
//! when the submission arrived, so later edits or deletions of the referrer do
//! not rewrite history. Only `submission_id` is a reference, used for
//! navigating to the detail view; deleting the submission does not delete the
//! notification.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{attribution::Attribution, store::DashboardStore, submission::Submission};

/// Label recorded when a submission resolved to no referrer.
pub const UNASSIGNED_LABEL: &str = "Unassigned";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  #[serde(rename = "id")]
  pub notification_id:   Uuid,
  pub creator_name:      String,
  pub employee_name:     String,
  pub is_admin_referrer: bool,
  pub submission_id:     Uuid,
  pub message:           String,
  pub created_at:        DateTime<Utc>,
}

/// Input to [`DashboardStore::add_notification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
  pub creator_name:      String,
  pub employee_name:     String,
  pub is_admin_referrer: bool,
  pub submission_id:     Uuid,
  pub message:           String,
}

impl NewNotification {
  /// Build the notification summarising `submission`.
  pub fn for_submission(submission: &Submission, attribution: &Attribution) -> Self {
    let creator_name = submission.creator.full_name();
    Self {
      message:           format!(
        "New video submission from {creator_name} (IP: {})",
        submission.originating_ip
      ),
      creator_name,
      employee_name:     referrer_label(attribution),
      is_admin_referrer: attribution.is_admin(),
      submission_id:     submission.submission_id,
    }
  }
}

/// `"Admin: <name>"`, the employee's name, or [`UNASSIGNED_LABEL`].
pub fn referrer_label(attribution: &Attribution) -> String {
  match attribution {
    Attribution::Admin(admin) => format!("Admin: {}", admin.label()),
    Attribution::Employee(employee) => employee.name.clone(),
    Attribution::Unassigned => UNASSIGNED_LABEL.to_owned(),
  }
}

/// Persist the notification for `submission`.
///
/// The submission is already durable when this runs; a failure here is the
/// caller's to log and must not undo it.
pub async fn emit<S: DashboardStore>(
  store: &S,
  submission: &Submission,
  attribution: &Attribution,
) -> Result<Notification, S::Error> {
  store
    .add_notification(NewNotification::for_submission(submission, attribution))
    .await
}
