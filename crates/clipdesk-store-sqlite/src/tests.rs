//! Integration tests for `SqliteStore` against an in-memory database.

use clipdesk_core::{
  Error as CoreError,
  attribution,
  dispatch::{DispatchConfig, Dispatcher},
  memory::{MemoryArtifacts, RecordingTransport, TransportMode, sample_payload},
  notification::NewNotification,
  referrer::{AdminUpdate, EmployeeUpdate, FormLinks, NewAdmin, NewEmployee},
  reports,
  store::{DashboardStore, StoreError},
  submission::{Answer, Submission},
};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn links() -> FormLinks { FormLinks::new("https://forms.example.com/submit") }

fn new_employee(name: &str, email: &str) -> NewEmployee {
  NewEmployee { name: name.into(), email: email.into() }
}

async fn submit(s: &SqliteStore, reference: Option<&str>) -> Submission {
  let input = sample_payload(reference).validate(Some("203.0.113.9".into())).unwrap();
  let attribution = attribution::resolve(s, reference).await.unwrap();
  s.add_submission(input, attribution.is_admin()).await.unwrap()
}

// ─── Employees ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_employee() {
  let s = store().await;

  let employee = s.add_employee(new_employee("Jane", "jane@example.com"), &links()).await.unwrap();
  assert_eq!(
    employee.form_link,
    format!("https://forms.example.com/submit/{}", employee.employee_id)
  );

  let fetched = s.get_employee(employee.employee_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Jane");
  assert_eq!(fetched.form_link, employee.form_link);
}

#[tokio::test]
async fn get_employee_missing_returns_none() {
  let s = store().await;
  assert!(s.get_employee(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_employees_in_insertion_order() {
  let s = store().await;
  for name in ["Zed", "Amy", "Mo"] {
    s.add_employee(new_employee(name, &format!("{name}@example.com")), &links())
      .await
      .unwrap();
  }

  let names: Vec<_> = s.list_employees().await.unwrap().into_iter().map(|e| e.name).collect();
  assert_eq!(names, ["Zed", "Amy", "Mo"]);
  assert_eq!(s.count_employees().await.unwrap(), 3);
}

#[tokio::test]
async fn duplicate_employee_email_is_rejected() {
  let s = store().await;
  s.add_employee(new_employee("Jane", "jane@example.com"), &links()).await.unwrap();

  let err = s
    .add_employee(new_employee("Other", "jane@example.com"), &links())
    .await
    .unwrap_err();
  assert!(matches!(err.as_core(), Some(CoreError::DuplicateEmail(_))));
}

#[tokio::test]
async fn employee_without_name_is_rejected() {
  let s = store().await;
  let err = s.add_employee(new_employee("", "x@example.com"), &links()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::Validation(_))));
}

#[tokio::test]
async fn update_employee_keeps_untouched_fields() {
  let s = store().await;
  let employee = s.add_employee(new_employee("Jane", "jane@example.com"), &links()).await.unwrap();
  s.add_employee(new_employee("Omar", "omar@example.com"), &links()).await.unwrap();

  let updated = s
    .update_employee(
      employee.employee_id,
      EmployeeUpdate { name: Some("Janet".into()), email: None },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "Janet");
  assert_eq!(updated.email, "jane@example.com");
  assert_eq!(updated.form_link, employee.form_link);

  let err = s
    .update_employee(
      employee.employee_id,
      EmployeeUpdate { name: None, email: Some("omar@example.com".into()) },
    )
    .await
    .unwrap_err();
  assert!(matches!(err.as_core(), Some(CoreError::DuplicateEmail(_))));

  let missing = s
    .update_employee(Uuid::new_v4(), EmployeeUpdate::default())
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn deleting_employee_keeps_submissions() {
  let s = store().await;
  let employee = s.add_employee(new_employee("Jane", "jane@example.com"), &links()).await.unwrap();
  let reference = employee.employee_id.to_string();
  let submission = submit(&s, Some(&reference)).await;

  assert!(s.delete_employee(employee.employee_id).await.unwrap());
  assert!(!s.delete_employee(employee.employee_id).await.unwrap());

  let kept = s.get_submission(submission.submission_id).await.unwrap().unwrap();
  assert_eq!(kept.referrer_ref.as_deref(), Some(reference.as_str()));
}

// ─── Admins ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_round_trip_and_lookup_by_email() {
  let s = store().await;
  let admin = s
    .add_admin(
      NewAdmin {
        email:         "ops@example.com".into(),
        password_hash: "$argon2id$v=19$stub".into(),
        display_name:  None,
      },
      &links(),
    )
    .await
    .unwrap();

  let found = s.find_admin_by_email("ops@example.com").await.unwrap().unwrap();
  assert_eq!(found.admin_id, admin.admin_id);
  assert_eq!(found.password_hash, "$argon2id$v=19$stub");
  assert!(s.find_admin_by_email("OPS@example.com").await.unwrap().is_none());

  let updated = s
    .update_admin(
      admin.admin_id,
      AdminUpdate { email: None, display_name: Some("Dana".into()) },
    )
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.label(), "Dana");
  assert_eq!(s.list_admins().await.unwrap().len(), 1);

  assert!(s.delete_admin(admin.admin_id).await.unwrap());
  assert!(s.get_admin(admin.admin_id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_admin_email_is_rejected() {
  let s = store().await;
  let input = NewAdmin {
    email:         "ops@example.com".into(),
    password_hash: "h".into(),
    display_name:  None,
  };
  s.add_admin(input.clone(), &links()).await.unwrap();
  let err = s.add_admin(input, &links()).await.unwrap_err();
  assert!(matches!(err.as_core(), Some(CoreError::DuplicateEmail(_))));
}

// ─── Submissions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn consent_answers_round_trip_exactly() {
  let s = store().await;
  let mut payload = sample_payload(None);
  payload.submitted_elsewhere = Some(Answer::Yes);
  payload.other_company_name = Some("Viral Co".into());
  payload.exclusive_rights = Some(false);
  payload.recorded_video = Some(false);
  let input = payload.validate(None).unwrap();
  let consent = input.consent.clone();

  let submission = s.add_submission(input, false).await.unwrap();
  let fetched = s.get_submission(submission.submission_id).await.unwrap().unwrap();

  assert_eq!(fetched.consent, consent);
  assert_eq!(fetched.originating_ip, "Unknown");
  assert_eq!(fetched.content.title.as_deref(), Some("Cat on a skateboard"));
}

#[tokio::test]
async fn unknown_reference_is_stored_verbatim() {
  let s = store().await;
  let reference = Uuid::new_v4().to_string();

  let submission = submit(&s, Some(&reference)).await;
  let fetched = s.get_submission(submission.submission_id).await.unwrap().unwrap();

  assert_eq!(fetched.referrer_ref.as_deref(), Some(reference.as_str()));
  assert!(!fetched.is_admin_referrer);
}

#[tokio::test]
async fn delete_submission_twice() {
  let s = store().await;
  let submission = submit(&s, None).await;

  assert!(s.delete_submission(submission.submission_id).await.unwrap());
  assert!(!s.delete_submission(submission.submission_id).await.unwrap());
  assert_eq!(s.count_submissions().await.unwrap(), 0);
}

#[tokio::test]
async fn submissions_for_employee_skip_admin_attributed() {
  let s = store().await;
  let employee = s.add_employee(new_employee("Jane", "jane@example.com"), &links()).await.unwrap();
  let reference = employee.employee_id.to_string();
  submit(&s, Some(&reference)).await;
  let input = sample_payload(Some(&reference)).validate(None).unwrap();
  s.add_submission(input, true).await.unwrap();

  let mine = s.submissions_for_employee(employee.employee_id).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert!(!mine[0].is_admin_referrer);
}

#[tokio::test]
async fn referrer_counts_rank_by_total() {
  let s = store().await;
  let a = Uuid::new_v4().to_string();
  let b = Uuid::new_v4().to_string();
  for reference in [&a, &b, &b, &a, &b] {
    submit(&s, Some(reference.as_str())).await;
  }
  submit(&s, None).await;

  let counts = s.referrer_counts().await.unwrap();
  assert_eq!(counts.len(), 2);
  assert_eq!(counts[0].referrer_ref, b);
  assert_eq!(counts[0].total, 3);
  assert_eq!(counts[1].total, 2);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_list_newest_first_and_outlive_submission() {
  let s = store().await;
  let first = submit(&s, None).await;
  let second = submit(&s, None).await;
  for submission in [&first, &second] {
    s.add_notification(NewNotification {
      creator_name:      "Ana Silva".into(),
      employee_name:     "Unassigned".into(),
      is_admin_referrer: false,
      submission_id:     submission.submission_id,
      message:           "New video submission from Ana Silva (IP: 203.0.113.9)".into(),
    })
    .await
    .unwrap();
  }

  s.delete_submission(first.submission_id).await.unwrap();

  let notifications = s.list_notifications().await.unwrap();
  assert_eq!(notifications.len(), 2);
  assert_eq!(notifications[0].submission_id, second.submission_id);
  assert_eq!(notifications[1].submission_id, first.submission_id);

  assert!(s.delete_notification(notifications[0].notification_id).await.unwrap());
  assert!(!s.delete_notification(notifications[0].notification_id).await.unwrap());
}

// ─── Workflow ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dispatch_against_sqlite() {
  let s = Arc::new(store().await);
  let employee = s.add_employee(new_employee("Jane", "jane@example.com"), &links()).await.unwrap();
  let mail = Arc::new(RecordingTransport::new(TransportMode::Deliver));
  let dispatcher = Dispatcher::new(
    s.clone(),
    mail.clone(),
    Arc::new(MemoryArtifacts::new()),
    DispatchConfig {
      operator_email: "ops@example.com".into(),
      sender:         "noreply@example.com".into(),
      mail_timeout:   Duration::from_secs(1),
    },
  );

  let reference = employee.employee_id.to_string();
  let report = dispatcher.submit(sample_payload(Some(&reference)), None).await.unwrap();
  assert!(!report.is_degraded());

  let notifications = s.list_notifications().await.unwrap();
  assert_eq!(notifications.len(), 1);
  assert_eq!(notifications[0].employee_name, "Jane");
  assert_eq!(notifications[0].submission_id, report.submission.submission_id);

  let top = reports::top_referrers(s.as_ref(), 3).await.unwrap();
  assert_eq!(top.len(), 1);
  assert_eq!(top[0].total_videos, 1);
  assert_eq!(mail.sent().len(), 2);
}
