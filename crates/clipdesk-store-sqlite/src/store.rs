//! [`SqliteStore`], the SQLite implementation of [`DashboardStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use clipdesk_core::{
  notification::{NewNotification, Notification},
  referrer::{Admin, AdminUpdate, Employee, EmployeeUpdate, FormLinks, NewAdmin, NewEmployee},
  store::{DashboardStore, ReferrerCount},
  submission::{NewSubmission, Submission},
};

use crate::{
  Error, Result,
  encode::{
    ADMIN_COLUMNS, EMPLOYEE_COLUMNS, NOTIFICATION_COLUMNS, RawAdmin, RawEmployee,
    RawNotification, RawSubmission, SUBMISSION_COLUMNS, encode_consent, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dashboard store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls are
/// serialised on the connection's thread, so a check-then-insert inside one
/// `call` closure cannot interleave with another.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete the row whose `column` equals `id`. Returns whether one existed.
  async fn delete_by_id(&self, table: &'static str, column: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("DELETE FROM {table} WHERE {column} = ?1"),
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    debug!(table, %id, deleted, "delete");
    Ok(deleted > 0)
  }

  async fn count_rows(&self, table: &'static str) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(count as u64)
  }
}

// ─── DashboardStore impl ─────────────────────────────────────────────────────

impl DashboardStore for SqliteStore {
  type Error = Error;

  // ── Admins ────────────────────────────────────────────────────────────────

  async fn add_admin(&self, input: NewAdmin, links: &FormLinks) -> Result<Admin> {
    input.validate()?;

    let now = Utc::now();
    let admin_id = Uuid::new_v4();
    let admin = Admin {
      admin_id,
      email: input.email,
      display_name: input.display_name,
      password_hash: input.password_hash,
      form_link: links.link_for(admin_id),
      created_at: now,
      updated_at: now,
    };

    let id_str   = encode_uuid(admin.admin_id);
    let email    = admin.email.clone();
    let name     = admin.display_name.clone();
    let hash     = admin.password_hash.clone();
    let link     = admin.form_link.clone();
    let at_str   = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row("SELECT 1 FROM admins WHERE email = ?1", rusqlite::params![email], |_| {
            Ok(())
          })
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO admins (
             admin_id, email, display_name, password_hash, form_link, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![id_str, email, name, hash, link, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(clipdesk_core::Error::DuplicateEmail(admin.email).into());
    }
    Ok(admin)
  }

  async fn get_admin(&self, id: Uuid) -> Result<Option<Admin>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAdmin> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE admin_id = ?1"),
              rusqlite::params![id_str],
              RawAdmin::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAdmin::into_admin).transpose()
  }

  async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
    let email = email.to_owned();

    let raw: Option<RawAdmin> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = ?1"),
              rusqlite::params![email],
              RawAdmin::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAdmin::into_admin).transpose()
  }

  async fn list_admins(&self) -> Result<Vec<Admin>> {
    let raws: Vec<RawAdmin> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {ADMIN_COLUMNS} FROM admins ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawAdmin::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAdmin::into_admin).collect()
  }

  async fn update_admin(&self, id: Uuid, update: AdminUpdate) -> Result<Option<Admin>> {
    if let Some(email) = &update.email {
      if email.trim().is_empty() {
        return Err(clipdesk_core::Error::Validation(vec!["email"]).into());
      }
    }

    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());
    let email  = update.email.clone();
    let name   = update.display_name;

    let outcome = self
      .conn
      .call(move |conn| {
        if let Some(email) = &email {
          let taken = conn
            .query_row(
              "SELECT 1 FROM admins WHERE email = ?1 AND admin_id != ?2",
              rusqlite::params![email, id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            return Ok(Updated::Conflict);
          }
        }
        let changed = conn.execute(
          "UPDATE admins
             SET email        = COALESCE(?2, email),
                 display_name = COALESCE(?3, display_name),
                 updated_at   = ?4
           WHERE admin_id = ?1",
          rusqlite::params![id_str, email, name, at_str],
        )?;
        Ok(if changed == 0 { Updated::Missing } else { Updated::Done })
      })
      .await?;

    match outcome {
      Updated::Conflict => Err(
        clipdesk_core::Error::DuplicateEmail(update.email.unwrap_or_default()).into(),
      ),
      Updated::Missing => Ok(None),
      Updated::Done => self.get_admin(id).await,
    }
  }

  async fn delete_admin(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("admins", "admin_id", id).await
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn add_employee(&self, input: NewEmployee, links: &FormLinks) -> Result<Employee> {
    input.validate()?;

    let now = Utc::now();
    let employee_id = Uuid::new_v4();
    let employee = Employee {
      employee_id,
      name: input.name,
      email: input.email,
      form_link: links.link_for(employee_id),
      created_at: now,
      updated_at: now,
    };

    let id_str = encode_uuid(employee.employee_id);
    let name   = employee.name.clone();
    let email  = employee.email.clone();
    let link   = employee.form_link.clone();
    let at_str = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM employees WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO employees (employee_id, name, email, form_link, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, name, email, link, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(clipdesk_core::Error::DuplicateEmail(employee.email).into());
    }
    Ok(employee)
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<Employee>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1"),
              rusqlite::params![id_str],
              RawEmployee::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn list_employees(&self) -> Result<Vec<Employee>> {
    let raws: Vec<RawEmployee> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawEmployee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmployee::into_employee).collect()
  }

  async fn update_employee(&self, id: Uuid, update: EmployeeUpdate) -> Result<Option<Employee>> {
    update.validate()?;

    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());
    let name   = update.name;
    let email  = update.email.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        if let Some(email) = &email {
          let taken = conn
            .query_row(
              "SELECT 1 FROM employees WHERE email = ?1 AND employee_id != ?2",
              rusqlite::params![email, id_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          if taken {
            return Ok(Updated::Conflict);
          }
        }
        let changed = conn.execute(
          "UPDATE employees
             SET name       = COALESCE(?2, name),
                 email      = COALESCE(?3, email),
                 updated_at = ?4
           WHERE employee_id = ?1",
          rusqlite::params![id_str, name, email, at_str],
        )?;
        Ok(if changed == 0 { Updated::Missing } else { Updated::Done })
      })
      .await?;

    match outcome {
      Updated::Conflict => Err(
        clipdesk_core::Error::DuplicateEmail(update.email.unwrap_or_default()).into(),
      ),
      Updated::Missing => Ok(None),
      Updated::Done => self.get_employee(id).await,
    }
  }

  async fn delete_employee(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("employees", "employee_id", id).await
  }

  async fn count_employees(&self) -> Result<u64> { self.count_rows("employees").await }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn add_submission(
    &self,
    input: NewSubmission,
    is_admin_referrer: bool,
  ) -> Result<Submission> {
    let now = Utc::now();
    let submission = Submission {
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
    };

    let id_str      = encode_uuid(submission.submission_id);
    let referrer    = submission.referrer_ref.clone();
    let creator     = submission.creator.clone();
    let content     = submission.content.clone();
    let consent_str = encode_consent(&submission.consent)?;
    let signature   = submission.signature.clone();
    let ip          = submission.originating_ip.clone();
    let at_str      = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO submissions (
             submission_id, referrer_ref, is_admin_referrer,
             first_name, last_name, email, country, social_handle,
             video_url, raw_video_url, title, description,
             consent, signature, originating_ip, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?16)",
          rusqlite::params![
            id_str,
            referrer,
            is_admin_referrer,
            creator.first_name,
            creator.last_name,
            creator.email,
            creator.country,
            creator.social_handle,
            content.video_url,
            content.raw_video_url,
            content.title,
            content.description,
            consent_str,
            signature,
            ip,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(submission)
  }

  async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubmission> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE submission_id = ?1"),
              rusqlite::params![id_str],
              RawSubmission::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubmission::into_submission).transpose()
  }

  async fn list_submissions(&self) -> Result<Vec<Submission>> {
    let raws: Vec<RawSubmission> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {SUBMISSION_COLUMNS} FROM submissions ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawSubmission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn submissions_for_employee(&self, employee_id: Uuid) -> Result<Vec<Submission>> {
    let ref_str = encode_uuid(employee_id);

    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBMISSION_COLUMNS} FROM submissions
           WHERE referrer_ref = ?1 AND is_admin_referrer = 0
           ORDER BY rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![ref_str], RawSubmission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn delete_submission(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("submissions", "submission_id", id).await
  }

  async fn count_submissions(&self) -> Result<u64> { self.count_rows("submissions").await }

  async fn referrer_counts(&self) -> Result<Vec<ReferrerCount>> {
    let rows: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT referrer_ref, COUNT(*) AS total
             FROM submissions
            WHERE referrer_ref IS NOT NULL AND referrer_ref != ''
            GROUP BY referrer_ref
            ORDER BY total DESC, referrer_ref ASC",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(referrer_ref, total)| ReferrerCount { referrer_ref, total: total as u64 })
        .collect(),
    )
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn add_notification(&self, input: NewNotification) -> Result<Notification> {
    let notification = Notification {
      notification_id:   Uuid::new_v4(),
      creator_name:      input.creator_name,
      employee_name:     input.employee_name,
      is_admin_referrer: input.is_admin_referrer,
      submission_id:     input.submission_id,
      message:           input.message,
      created_at:        Utc::now(),
    };

    let id_str         = encode_uuid(notification.notification_id);
    let creator_name   = notification.creator_name.clone();
    let employee_name  = notification.employee_name.clone();
    let is_admin       = notification.is_admin_referrer;
    let submission_str = encode_uuid(notification.submission_id);
    let message        = notification.message.clone();
    let at_str         = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, creator_name, employee_name,
             is_admin_referrer, submission_id, message, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str,
            creator_name,
            employee_name,
            is_admin,
            submission_str,
            message,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn list_notifications(&self) -> Result<Vec<Notification>> {
    // rowid follows insertion, which is creation order.
    let raws: Vec<RawNotification> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn delete_notification(&self, id: Uuid) -> Result<bool> {
    self.delete_by_id("notifications", "notification_id", id).await
  }
}

/// Result of a conditional update run inside a single `call`.
enum Updated {
  Done,
  Missing,
  Conflict,
}
