//! The submission workflow: validate, attribute, persist, then fan out the
//! signature artifact, the two emails and the dashboard notification.
//!
//! Everything up to and including persistence is fatal. Once the submission
//! is durable every later step is best-effort: its outcome is recorded in the
//! returned [`DispatchReport`] and logged, and the caller still sees success.
//! Reporting failure at that point would invite the submitter to resend and
//! create a duplicate.

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
  attribution::{self, Attribution},
  mail::{self, MailTransport, OutboundEmail},
  notification::{self, Notification},
  signature::{ArtifactStore, SignatureImage},
  store::DashboardStore,
  submission::{Submission, SubmissionPayload},
};

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DispatchConfig {
  /// Fixed recipient of the full submission summary.
  pub operator_email: String,
  /// `From` address on every outbound email.
  pub sender:         String,
  /// Upper bound on a single email send.
  pub mail_timeout:   Duration,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Progress through the workflow. Only stages at or after `Persisted` can
/// produce a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
  Received,
  Validated,
  Attributed,
  Persisted,
  NotifiedOperator,
  NotifiedReferrer,
  Logged,
  Complete,
}

/// A best-effort step run after persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  StoreSignature,
  NotifyOperator,
  NotifyReferrer,
  RecordNotification,
}

impl Step {
  pub fn name(self) -> &'static str {
    match self {
      Self::StoreSignature => "store_signature",
      Self::NotifyOperator => "notify_operator",
      Self::NotifyReferrer => "notify_referrer",
      Self::RecordNotification => "record_notification",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
  Done,
  Skipped(&'static str),
  Failed(String),
  TimedOut,
}

impl StepOutcome {
  pub fn is_failure(&self) -> bool { matches!(self, Self::Failed(_) | Self::TimedOut) }
}

#[derive(Debug, Clone)]
pub struct StepRecord {
  pub step:    Step,
  pub outcome: StepOutcome,
}

/// What happened to an accepted submission.
#[derive(Debug, Clone)]
pub struct DispatchReport {
  pub submission:   Submission,
  pub attribution:  Attribution,
  /// `None` when recording the notification failed.
  pub notification: Option<Notification>,
  pub steps:        Vec<StepRecord>,
  /// Every stage reached, in order. `NotifiedReferrer` only appears when a
  /// referrer email was attempted.
  pub stages:       Vec<Stage>,
}

impl DispatchReport {
  /// True if any best-effort step failed or timed out.
  pub fn is_degraded(&self) -> bool { self.steps.iter().any(|r| r.outcome.is_failure()) }

  /// The last stage reached.
  pub fn stage(&self) -> Stage { self.stages.last().copied().unwrap_or(Stage::Received) }

  pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
    self.steps.iter().find(|r| r.step == step).map(|r| &r.outcome)
  }
}

#[derive(Debug, Error)]
pub enum DispatchError {
  /// The payload was rejected; nothing was persisted.
  #[error(transparent)]
  Validation(crate::Error),

  /// The store failed before the submission became durable.
  #[error("failed to persist submission: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Runs the submission workflow against injected collaborators.
pub struct Dispatcher<S, M, A> {
  store:     Arc<S>,
  mail:      Arc<M>,
  artifacts: Arc<A>,
  config:    DispatchConfig,
}

impl<S, M, A> Dispatcher<S, M, A>
where
  S: DashboardStore,
  M: MailTransport,
  A: ArtifactStore,
{
  pub fn new(store: Arc<S>, mail: Arc<M>, artifacts: Arc<A>, config: DispatchConfig) -> Self {
    Self { store, mail, artifacts, config }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Accept a submission from the public form.
  ///
  /// Returns `Err` only if the payload is invalid or the submission could not
  /// be persisted. Any later failure is reported in the returned
  /// [`DispatchReport`] and the logs.
  pub async fn submit(
    &self,
    payload: SubmissionPayload,
    originating_ip: Option<String>,
  ) -> Result<DispatchReport, DispatchError> {
    let mut stages = vec![Stage::Received];

    let input = payload.validate(originating_ip).map_err(|e| {
      debug!(error = %e, "rejected submission");
      DispatchError::Validation(e)
    })?;
    advance(&mut stages, Stage::Validated, None);

    let attribution = attribution::resolve(self.store.as_ref(), input.referrer_ref.as_deref())
      .await
      .map_err(|e| {
        error!(error = %e, "referrer lookup failed");
        DispatchError::Store(Box::new(e))
      })?;
    advance(&mut stages, Stage::Attributed, None);

    let submission = self
      .store
      .add_submission(input, attribution.is_admin())
      .await
      .map_err(|e| {
        error!(error = %e, "failed to persist submission");
        DispatchError::Store(Box::new(e))
      })?;
    let id = submission.submission_id;
    advance(&mut stages, Stage::Persisted, Some(id));
    info!(
      submission_id = %id,
      attribution = ?attribution.kind(),
      "submission persisted"
    );

    let mut steps = Vec::with_capacity(4);

    // Signature artifact. The decoded image is reused by the operator email
    // even if writing the artifact fails.
    let signature = match SignatureImage::decode(&submission.signature) {
      Ok(image) => {
        let name = image.artifact_name(id);
        let outcome = match self.artifacts.put(&name, &image).await {
          Ok(stored) => {
            debug!(submission_id = %id, location = %stored.location, "stored signature");
            StepOutcome::Done
          }
          Err(e) => StepOutcome::Failed(e.to_string()),
        };
        record(&mut steps, id, Step::StoreSignature, outcome);
        Some(image)
      }
      Err(e) => {
        record(&mut steps, id, Step::StoreSignature, StepOutcome::Failed(e.to_string()));
        None
      }
    };

    let operator = mail::operator_email(
      &self.config.sender,
      &self.config.operator_email,
      &submission,
      &attribution,
      signature.as_ref(),
    );
    let outcome = self.send_bounded(&operator).await;
    record(&mut steps, id, Step::NotifyOperator, outcome);
    advance(&mut stages, Stage::NotifiedOperator, Some(id));

    match mail::referrer_email(&self.config.sender, &submission, &attribution) {
      Some(email) => {
        let outcome = self.send_bounded(&email).await;
        record(&mut steps, id, Step::NotifyReferrer, outcome);
        advance(&mut stages, Stage::NotifiedReferrer, Some(id));
      }
      None => record(&mut steps, id, Step::NotifyReferrer, StepOutcome::Skipped("no referrer email")),
    }

    let notification =
      match notification::emit(self.store.as_ref(), &submission, &attribution).await {
        Ok(n) => {
          record(&mut steps, id, Step::RecordNotification, StepOutcome::Done);
          Some(n)
        }
        Err(e) => {
          record(
            &mut steps,
            id,
            Step::RecordNotification,
            StepOutcome::Failed(e.to_string()),
          );
          None
        }
      };
    advance(&mut stages, Stage::Logged, Some(id));
    advance(&mut stages, Stage::Complete, Some(id));

    let report = DispatchReport { submission, attribution, notification, steps, stages };
    if report.is_degraded() {
      warn!(submission_id = %id, "submission accepted with failed follow-up steps");
    }
    Ok(report)
  }

  async fn send_bounded(&self, email: &OutboundEmail) -> StepOutcome {
    match tokio::time::timeout(self.config.mail_timeout, self.mail.send(email)).await {
      Ok(Ok(())) => StepOutcome::Done,
      Ok(Err(e)) => StepOutcome::Failed(e.to_string()),
      Err(_) => StepOutcome::TimedOut,
    }
  }
}

fn advance(stages: &mut Vec<Stage>, next: Stage, submission_id: Option<Uuid>) {
  debug!(from = ?stages.last(), to = ?next, submission_id = ?submission_id, "dispatch stage");
  stages.push(next);
}

fn record(steps: &mut Vec<StepRecord>, submission_id: Uuid, step: Step, outcome: StepOutcome) {
  match &outcome {
    StepOutcome::Done => debug!(%submission_id, step = step.name(), "step done"),
    StepOutcome::Skipped(reason) => {
      debug!(%submission_id, step = step.name(), reason, "step skipped")
    }
    StepOutcome::Failed(reason) if step == Step::RecordNotification => {
      error!(%submission_id, step = step.name(), error = %reason, "step failed")
    }
    StepOutcome::Failed(reason) => {
      warn!(%submission_id, step = step.name(), error = %reason, "step failed")
    }
    StepOutcome::TimedOut => warn!(%submission_id, step = step.name(), "step timed out"),
  }
  steps.push(StepRecord { step, outcome });
}
