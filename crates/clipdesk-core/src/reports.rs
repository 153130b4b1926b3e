//! Read-only views over submissions and the referrer directory.
//!
//! Referrer names and emails shown here are looked up live on every call.
//! They are for display only; the stored attribution flag is never touched.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  attribution::{self, Attribution},
  notification::UNASSIGNED_LABEL,
  store::DashboardStore,
  submission::{Answer, Submission},
};

/// Title shown when a submission was sent without one.
pub const UNTITLED: &str = "Untitled Video";

// ─── Submission list ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRow {
  pub id:                Uuid,
  pub employee_name:     String,
  pub employee_email:    String,
  pub is_admin_referrer: bool,
  #[serde(rename = "videoURL")]
  pub video_url:         String,
  pub description:       Option<String>,
  pub creator_name:      String,
  pub email:             String,
  pub created_at:        DateTime<Utc>,
  pub user_ip:           String,
}

/// Every submission with its referrer's current name and email.
pub async fn submission_rows<S: DashboardStore>(store: &S) -> Result<Vec<SubmissionRow>, S::Error> {
  let submissions = store.list_submissions().await?;
  let mut rows = Vec::with_capacity(submissions.len());
  for submission in submissions {
    let attribution = attribution::resolve_stored(
      store,
      submission.referrer_ref.as_deref(),
      submission.is_admin_referrer,
    )
    .await?;
    rows.push(SubmissionRow {
      id:                submission.submission_id,
      employee_name:     attribution.display_name().unwrap_or(UNASSIGNED_LABEL).to_owned(),
      employee_email:    attribution.email().unwrap_or_default().to_owned(),
      is_admin_referrer: submission.is_admin_referrer,
      video_url:         submission.content.video_url.clone(),
      description:       submission.content.description.clone(),
      creator_name:      submission.creator.full_name(),
      email:             submission.creator.email.clone(),
      created_at:        submission.created_at,
      user_ip:           submission.originating_ip.clone(),
    });
  }
  Ok(rows)
}

// ─── Submission detail ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReferrerContact {
  pub name:  String,
  pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
  pub id:                     Uuid,
  pub title:                  String,
  pub description:            Option<String>,
  #[serde(rename = "videoURL")]
  pub video_url:              String,
  #[serde(rename = "rawVideoURL")]
  pub raw_video_url:          String,
  pub first_name:             String,
  pub last_name:              String,
  pub creator_name:           String,
  pub email:                  String,
  pub social_handle:          String,
  pub country:                String,
  pub recorded_video:         bool,
  pub recorded_by:            String,
  pub submitted_elsewhere:    Answer,
  pub other_company_name:     Option<String>,
  pub not_uploaded_elsewhere: bool,
  #[serde(rename = "agreed18")]
  pub agreed_18:              bool,
  pub agreed_terms:           bool,
  pub exclusive_rights:       bool,
  pub referrer_ref:           Option<String>,
  pub is_admin_referrer:      bool,
  pub employee:               Option<ReferrerContact>,
  pub signature:              String,
  pub user_ip:                String,
  pub created_at:             DateTime<Utc>,
  pub updated_at:             DateTime<Utc>,
}

/// One submission with its referrer's contact details. `None` if the
/// submission does not exist.
pub async fn submission_detail<S: DashboardStore>(
  store: &S,
  id: Uuid,
) -> Result<Option<SubmissionDetail>, S::Error> {
  let Some(submission) = store.get_submission(id).await? else {
    return Ok(None);
  };
  let attribution = attribution::resolve_stored(
    store,
    submission.referrer_ref.as_deref(),
    submission.is_admin_referrer,
  )
  .await?;
  Ok(Some(detail(submission, &attribution)))
}

fn detail(submission: Submission, attribution: &Attribution) -> SubmissionDetail {
  let employee = match (attribution.display_name(), attribution.email()) {
    (Some(name), Some(email)) => {
      Some(ReferrerContact { name: name.to_owned(), email: email.to_owned() })
    }
    _ => None,
  };
  let Submission {
    submission_id,
    referrer_ref,
    is_admin_referrer,
    creator,
    content,
    consent,
    signature,
    originating_ip,
    created_at,
    updated_at,
  } = submission;

  SubmissionDetail {
    id: submission_id,
    title: content
      .title
      .filter(|t| !t.trim().is_empty())
      .unwrap_or_else(|| UNTITLED.to_owned()),
    description: content.description,
    video_url: content.video_url,
    raw_video_url: content.raw_video_url,
    creator_name: creator.full_name(),
    first_name: creator.first_name,
    last_name: creator.last_name,
    email: creator.email,
    social_handle: creator.social_handle,
    country: creator.country,
    recorded_video: consent.recorded_video,
    recorded_by: consent.recorded_by,
    submitted_elsewhere: consent.submitted_elsewhere,
    other_company_name: consent.other_company_name,
    not_uploaded_elsewhere: consent.not_uploaded_elsewhere,
    agreed_18: consent.agreed_18,
    agreed_terms: consent.agreed_terms,
    exclusive_rights: consent.exclusive_rights,
    referrer_ref,
    is_admin_referrer,
    employee,
    signature,
    user_ip: originating_ip,
    created_at,
    updated_at,
  }
}

// ─── Employee videos ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeVideo {
  pub id:            Uuid,
  pub employee_id:   Uuid,
  pub employee_name: String,
  #[serde(rename = "videoURL")]
  pub video_url:     String,
  pub title:         String,
  pub creator_name:  String,
  pub email:         String,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Submissions made through an employee's form link. `None` if the employee
/// does not exist.
pub async fn employee_videos<S: DashboardStore>(
  store: &S,
  employee_id: Uuid,
) -> Result<Option<Vec<EmployeeVideo>>, S::Error> {
  let Some(employee) = store.get_employee(employee_id).await? else {
    return Ok(None);
  };
  let videos = store
    .submissions_for_employee(employee_id)
    .await?
    .into_iter()
    .map(|s| EmployeeVideo {
      id:            s.submission_id,
      employee_id,
      employee_name: employee.name.clone(),
      creator_name:  s.creator.full_name(),
      video_url:     s.content.video_url,
      title:         s.content.title.unwrap_or_default(),
      email:         s.creator.email,
      created_at:    s.created_at,
      updated_at:    s.updated_at,
    })
    .collect();
  Ok(Some(videos))
}

// ─── Top referrers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopReferrer {
  pub emp_ref:      String,
  pub name:         String,
  pub email:        String,
  pub form_link:    String,
  pub total_videos: u64,
}

/// The `limit` employees credited with the most submissions.
///
/// References that resolve to an admin, or to nobody, are skipped and the
/// scan continues down the ranking until `limit` employees are found.
pub async fn top_referrers<S: DashboardStore>(
  store: &S,
  limit: usize,
) -> Result<Vec<TopReferrer>, S::Error> {
  let mut top = Vec::with_capacity(limit);
  for count in store.referrer_counts().await? {
    if top.len() == limit {
      break;
    }
    if let Attribution::Employee(employee) =
      attribution::resolve(store, Some(&count.referrer_ref)).await?
    {
      top.push(TopReferrer {
        emp_ref:      count.referrer_ref,
        name:         employee.name,
        email:        employee.email,
        form_link:    employee.form_link,
        total_videos: count.total,
      });
    }
  }
  Ok(top)
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub total_videos:    u64,
  pub total_employees: u64,
}

pub async fn stats<S: DashboardStore>(store: &S) -> Result<Stats, S::Error> {
  Ok(Stats {
    total_videos:    store.count_submissions().await?,
    total_employees: store.count_employees().await?,
  })
}

// ─── Recent submissions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSubmission {
  pub creator_name: String,
  pub created_at:   DateTime<Utc>,
  pub id:           Uuid,
}

/// The `limit` most recently created submissions, newest first.
pub async fn recent_submissions<S: DashboardStore>(
  store: &S,
  limit: usize,
) -> Result<Vec<RecentSubmission>, S::Error> {
  let mut submissions = store.list_submissions().await?;
  // Stable sort keeps insertion order for equal timestamps; reverse it so the
  // later insert wins.
  submissions.reverse();
  submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  Ok(
    submissions
      .into_iter()
      .take(limit)
      .map(|s| RecentSubmission {
        creator_name: s.creator.full_name(),
        created_at:   s.created_at,
        id:           s.submission_id,
      })
      .collect(),
  )
}
