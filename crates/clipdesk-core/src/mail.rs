//! Outbound email composition and the transport seam.
//!
//! Everything interpolated from a submission is HTML-escaped; the public form
//! is unauthenticated and its text lands in the operator's inbox verbatim.

use std::{fmt::Write as _, future::Future};

use bytes::Bytes;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::{
  attribution::Attribution, notification::referrer_label, signature::SignatureImage,
  submission::Submission,
};

pub const OPERATOR_SUBJECT: &str = "New Video Submission Received";
pub const REFERRER_SUBJECT: &str = "New Video Submission Notification";

/// Consent statements as worded on the submission form. Each boolean in
/// [`crate::submission::Consent`] answers the statement it is paired with.
pub const RECORDED_VIDEO_LABEL: &str = "I recorded this video";
pub const NOT_UPLOADED_LABEL: &str = "This video has not been uploaded anywhere else";
pub const AGREED_18_LABEL: &str = "I verify that I am at least 18 years old";
pub const AGREED_TERMS_LABEL: &str = "I consent to the Terms of Submission and Privacy Agreement";
pub const EXCLUSIVE_RIGHTS_LABEL: &str = "I have not given exclusive rights to this video";

/// Content id the operator email uses to reference the signature image.
pub const SIGNATURE_CONTENT_ID: &str = "signatureImage";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
  pub content_id: String,
  pub file_name:  String,
  pub media_type: String,
  pub bytes:      Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
  pub from:    String,
  pub to:      String,
  pub subject: String,
  pub html:    String,
  pub inline:  Vec<InlineImage>,
}

/// Delivers composed email. Implementations should not retry internally; the
/// dispatcher bounds each send with its own timeout.
pub trait MailTransport: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    email: &'a OutboundEmail,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Operator email ──────────────────────────────────────────────────────────

/// The full submission summary sent to the operator inbox.
///
/// When `signature` is `None` the image is omitted and a note takes its place.
pub fn operator_email(
  from: &str,
  to: &str,
  submission: &Submission,
  attribution: &Attribution,
  signature: Option<&SignatureImage>,
) -> OutboundEmail {
  let creator = &submission.creator;
  let content = &submission.content;
  let consent = &submission.consent;

  let mut html = String::new();
  html.push_str("<h2>Submission Notification</h2>\n");
  html.push_str("<p>A new video has been submitted.</p>\n");

  html.push_str("<h3>Submission Details</h3>\n");
  row(&mut html, "Video Title", content.title.as_deref().unwrap_or(""));
  row(&mut html, "Description", content.description.as_deref().unwrap_or(""));
  row(&mut html, "Name", &creator.full_name());
  let _ = writeln!(
    html,
    "<p><strong>Email:</strong> <a href=\"mailto:{}\">{}</a></p>",
    attr(&creator.email),
    text(&creator.email)
  );
  row(&mut html, "Country", &creator.country);
  row(&mut html, "Social Handle", &creator.social_handle);
  row(&mut html, "IP Address", &submission.originating_ip);
  row(&mut html, "Referred By", &referrer_label(attribution));
  row(&mut html, "Who recorded this video?", &consent.recorded_by);
  row(
    &mut html,
    "Submitted to another company?",
    if consent.submitted_elsewhere.is_yes() { "Yes" } else { "No" },
  );
  if consent.submitted_elsewhere.is_yes() {
    if let Some(other) = consent.other_company_name.as_deref() {
      row(&mut html, "Other Company Name", other);
    }
  }

  html.push_str("<h3>Video Links</h3>\n");
  link(&mut html, "Watch Video", &content.video_url, "Click Here");
  link(&mut html, "Download Raw Footage", &content.raw_video_url, "Download");

  html.push_str("<h3>Submission Confirmation</h3>\n<ul>\n");
  item(&mut html, RECORDED_VIDEO_LABEL, yes_no(consent.recorded_video));
  item(&mut html, NOT_UPLOADED_LABEL, yes_no(consent.not_uploaded_elsewhere));
  item(&mut html, AGREED_18_LABEL, yes_no(consent.agreed_18));
  item(
    &mut html,
    AGREED_TERMS_LABEL,
    if consent.agreed_terms { "Yes, I agree" } else { "No, I do not agree" },
  );
  item(&mut html, EXCLUSIVE_RIGHTS_LABEL, yes_no(consent.exclusive_rights));
  html.push_str("</ul>\n");

  html.push_str("<h3>User Signature</h3>\n");
  let inline = match signature {
    Some(image) => {
      let _ = writeln!(html, "<img src=\"cid:{SIGNATURE_CONTENT_ID}\" width=\"240\" />");
      vec![InlineImage {
        content_id: SIGNATURE_CONTENT_ID.to_owned(),
        file_name:  image.artifact_name(submission.submission_id),
        media_type: image.media_type.clone(),
        bytes:      image.bytes.clone(),
      }]
    }
    None => {
      html.push_str("<p><em>Signature could not be attached.</em></p>\n");
      Vec::new()
    }
  };

  OutboundEmail {
    from: from.to_owned(),
    to: to.to_owned(),
    subject: OPERATOR_SUBJECT.to_owned(),
    html,
    inline,
  }
}

// ─── Referrer email ──────────────────────────────────────────────────────────

/// A short note to the credited referrer. `None` when the submission is
/// unassigned or the referrer has no email on file.
pub fn referrer_email(
  from: &str,
  submission: &Submission,
  attribution: &Attribution,
) -> Option<OutboundEmail> {
  let to = attribution.email().filter(|e| !e.trim().is_empty())?;
  let name = attribution.display_name().unwrap_or_default();

  let html = format!(
    "<p>Hello {},</p>\n<p>You have a new video submission from <strong>{}</strong>.</p>\n",
    text(name),
    text(&submission.creator.full_name()),
  );

  Some(OutboundEmail {
    from: from.to_owned(),
    to: to.to_owned(),
    subject: REFERRER_SUBJECT.to_owned(),
    html,
    inline: Vec::new(),
  })
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn row(html: &mut String, label: &str, value: &str) {
  let _ = writeln!(html, "<p><strong>{label}:</strong> {}</p>", text(value));
}

fn link(html: &mut String, label: &str, href: &str, caption: &str) {
  let _ = writeln!(
    html,
    "<p><strong>{label}:</strong> <a href=\"{}\" target=\"_blank\">{caption}</a></p>",
    attr(href)
  );
}

fn yes_no(value: bool) -> &'static str { if value { "Yes" } else { "No" } }

fn item(html: &mut String, label: &str, answer: &str) {
  let _ = writeln!(html, "<li>{label}:<br /><strong>{answer}</strong></li>");
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::memory::sample_submission;

  #[test]
  fn operator_email_escapes_submitted_text() {
    let mut submission = sample_submission(None);
    submission.creator.first_name = "<script>alert(1)</script>".into();
    submission.content.video_url = "https://x.example/\"onmouseover=\"x".into();

    let email = operator_email(
      "noreply@example.com",
      "ops@example.com",
      &submission,
      &Attribution::Unassigned,
      None,
    );

    assert_eq!(email.subject, OPERATOR_SUBJECT);
    assert!(!email.html.contains("<script>"));
    assert!(email.html.contains("&lt;script&gt;"));
    assert!(!email.html.contains("\"onmouseover=\""));
    assert!(email.inline.is_empty());
  }

  #[test]
  fn operator_email_inlines_signature() {
    let submission = sample_submission(None);
    let image = SignatureImage::decode(&submission.signature).unwrap();
    let email = operator_email(
      "noreply@example.com",
      "ops@example.com",
      &submission,
      &Attribution::Unassigned,
      Some(&image),
    );

    assert!(email.html.contains("cid:signatureImage"));
    assert_eq!(email.inline.len(), 1);
    assert_eq!(email.inline[0].content_id, SIGNATURE_CONTENT_ID);
  }

  #[test]
  fn consent_answers_use_form_wording() {
    let mut submission = sample_submission(None);
    submission.consent.exclusive_rights = true;
    submission.consent.agreed_terms = false;
    let email = operator_email(
      "noreply@example.com",
      "ops@example.com",
      &submission,
      &Attribution::Unassigned,
      None,
    );

    assert!(email.html.contains(
      "<li>I have not given exclusive rights to this video:<br /><strong>Yes</strong></li>"
    ));
    assert!(email.html.contains(
      "<li>I verify that I am at least 18 years old:<br /><strong>Yes</strong></li>"
    ));
    assert!(email.html.contains(
      "<li>I consent to the Terms of Submission and Privacy Agreement:<br /><strong>No, I do not agree</strong></li>"
    ));
    assert!(!email.html.contains("Exclusive rights:"));
  }

  #[test]
  fn admin_referrer_is_labelled_like_the_notification() {
    let now = chrono::Utc::now();
    let admin = crate::referrer::Admin {
      admin_id:      uuid::Uuid::new_v4(),
      email:         "ops@example.com".into(),
      display_name:  Some("Rita".into()),
      password_hash: "h".into(),
      form_link:     "https://forms.example.com/submit/x".into(),
      created_at:    now,
      updated_at:    now,
    };
    let submission = sample_submission(None);
    let email = operator_email(
      "noreply@example.com",
      "ops@example.com",
      &submission,
      &Attribution::Admin(admin),
      None,
    );
    assert!(email.html.contains("<strong>Referred By:</strong> Admin: Rita</p>"));

    let email = operator_email(
      "noreply@example.com",
      "ops@example.com",
      &submission,
      &Attribution::Unassigned,
      None,
    );
    assert!(email.html.contains("<strong>Referred By:</strong> Unassigned</p>"));
  }

  #[test]
  fn unassigned_submission_has_no_referrer_email() {
    let submission = sample_submission(None);
    assert!(referrer_email("noreply@example.com", &submission, &Attribution::Unassigned).is_none());
  }
}
