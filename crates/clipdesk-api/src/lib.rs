//! JSON REST API for the clipdesk dashboard.
//!
//! Exposes two axum [`Router`]s: a public one carrying the video submission
//! form, and an admin one for the dashboard's CRUD and reporting views. Both
//! are backed by any [`clipdesk_core::store::DashboardStore`]. Auth, CORS,
//! TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new().nest(
//!   "/api",
//!   clipdesk_api::admin_router(store.clone(), links.clone())
//!     .merge(clipdesk_api::public_router(dispatcher.clone())),
//! )
//! ```

pub mod employees;
pub mod error;
pub mod notifications;
pub mod reports;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  extract::FromRef,
  routing::{get, post},
};
use clipdesk_core::{
  dispatch::Dispatcher, mail::MailTransport, referrer::FormLinks, signature::ArtifactStore,
  store::DashboardStore,
};

pub use error::ApiError;

// ─── Admin router ────────────────────────────────────────────────────────────

/// Shared state for the admin router.
pub struct AdminState<S> {
  pub store: Arc<S>,
  pub links: Arc<FormLinks>,
}

impl<S> Clone for AdminState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), links: self.links.clone() }
  }
}

impl<S> FromRef<AdminState<S>> for Arc<S> {
  fn from_ref(state: &AdminState<S>) -> Self { state.store.clone() }
}

/// Build the admin router for `store`.
///
/// `links` derives the form link handed to each new employee. The returned
/// `Router<()>` can be nested into any parent router regardless of its own
/// state type.
pub fn admin_router<S>(store: Arc<S>, links: Arc<FormLinks>) -> Router<()>
where
  S: DashboardStore + 'static,
{
  Router::new()
    // Employees
    .route("/employees", get(employees::list::<S>).post(employees::create::<S>))
    .route(
      "/employees/{id}",
      get(employees::get_one::<S>)
        .put(employees::update::<S>)
        .delete(employees::delete::<S>),
    )
    .route("/employees/{id}/videos", get(employees::videos::<S>))
    // Submissions
    .route("/submissions", get(submissions::list::<S>))
    .route(
      "/submissions/{id}",
      get(submissions::get_one::<S>).delete(submissions::delete::<S>),
    )
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/{id}", axum::routing::delete(notifications::delete::<S>))
    // Reports
    .route("/stats", get(reports::stats::<S>))
    .route("/top-employees", get(reports::top_employees::<S>))
    .route("/recent-submissions", get(reports::recent_submissions::<S>))
    .with_state(AdminState { store, links })
}

// ─── Public router ───────────────────────────────────────────────────────────

/// Build the public router carrying `POST /submit-video`.
pub fn public_router<S, M, A>(dispatcher: Arc<Dispatcher<S, M, A>>) -> Router<()>
where
  S: DashboardStore + 'static,
  M: MailTransport + 'static,
  A: ArtifactStore + 'static,
{
  Router::new()
    .route("/submit-video", post(submissions::submit::<S, M, A>))
    .with_state(dispatcher)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
  };
  use clipdesk_core::{
    dispatch::DispatchConfig,
    memory::{MemoryArtifacts, MemoryStore, RecordingTransport, TransportMode, sample_payload},
    referrer::NewEmployee,
  };
  use clipdesk_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  fn links() -> Arc<FormLinks> { Arc::new(FormLinks::new("https://forms.example.com/submit")) }

  fn dispatcher<S: DashboardStore>(
    store: Arc<S>,
    mail: Arc<RecordingTransport>,
  ) -> Arc<Dispatcher<S, RecordingTransport, MemoryArtifacts>> {
    Arc::new(Dispatcher::new(
      store,
      mail,
      Arc::new(MemoryArtifacts::new()),
      DispatchConfig {
        operator_email: "ops@example.com".into(),
        sender:         "noreply@example.com".into(),
        mail_timeout:   Duration::from_millis(200),
      },
    ))
  }

  /// The full API surface over one SQLite store and a recording transport.
  async fn app() -> (Router, Arc<SqliteStore>, Arc<RecordingTransport>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let mail = Arc::new(RecordingTransport::new(TransportMode::Deliver));
    let router = admin_router(store.clone(), links())
      .merge(public_router(dispatcher(store.clone(), mail.clone())));
    (router, store, mail)
  }

  async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    headers: Vec<(&str, &str)>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let body = match body {
      Some(json) => {
        builder = builder.header("content-type", "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn payload_json(reference: Option<&str>) -> Value {
    let p = sample_payload(reference);
    json!({
      "referrerRef": p.referrer_ref,
      "title": p.title,
      "videoURL": p.video_url,
      "rawVideoURL": p.raw_video_url,
      "firstName": p.first_name,
      "lastName": p.last_name,
      "socialHandle": p.social_handle,
      "country": p.country,
      "email": p.email,
      "recordedVideo": true,
      "recordedBy": "Me",
      "submittedElsewhere": "No",
      "notUploadedElsewhere": true,
      "agreed18": true,
      "agreedTerms": true,
      "exclusiveRights": true,
      "signature": p.signature,
    })
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn employee_crud() {
    let (router, _, _) = app().await;

    let resp = send(
      &router,
      "POST",
      "/employees",
      vec![],
      Some(json!({ "name": "Jane", "email": "jane@example.com" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    let id = created["employee"]["id"].as_str().unwrap().to_owned();
    assert_eq!(
      created["formLink"],
      format!("https://forms.example.com/submit/{id}")
    );

    let resp = send(&router, "GET", "/employees", vec![], None).await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

    let resp = send(
      &router,
      "PUT",
      &format!("/employees/{id}"),
      vec![],
      Some(json!({ "name": "Janet" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["name"], "Janet");

    let resp = send(&router, "DELETE", &format!("/employees/{id}"), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&router, "DELETE", &format!("/employees/{id}"), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = send(&router, "GET", &format!("/employees/{id}"), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn employee_validation_and_conflict() {
    let (router, _, _) = app().await;
    let body = json!({ "name": "Jane", "email": "jane@example.com" });

    let resp = send(&router, "POST", "/employees", vec![], Some(json!({ "name": "Jane" }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    send(&router, "POST", "/employees", vec![], Some(body.clone())).await;
    let resp = send(&router, "POST", "/employees", vec![], Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(json_body(resp).await["error"].is_string());
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_then_review() {
    let (router, store, mail) = app().await;
    let employee = store
      .add_employee(
        NewEmployee { name: "Jane".into(), email: "jane@example.com".into() },
        &FormLinks::new("https://forms.example.com/submit"),
      )
      .await
      .unwrap();
    let reference = employee.employee_id.to_string();

    let resp = send(
      &router,
      "POST",
      "/submit-video",
      vec![("x-forwarded-for", "203.0.113.9, 10.0.0.1")],
      Some(payload_json(Some(&reference))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["message"], "Submission successful");
    assert_eq!(mail.sent().len(), 2);

    let rows = json_body(send(&router, "GET", "/submissions", vec![], None).await).await;
    let row = &rows[0];
    assert_eq!(row["employeeName"], "Jane");
    assert_eq!(row["userIp"], "203.0.113.9");
    assert_eq!(row["isAdminReferrer"], false);
    let id = row["id"].as_str().unwrap().to_owned();

    let detail = json_body(send(&router, "GET", &format!("/submissions/{id}"), vec![], None).await).await;
    assert_eq!(detail["employee"]["email"], "jane@example.com");
    assert_eq!(detail["agreed18"], true);

    let videos = json_body(
      send(&router, "GET", &format!("/employees/{reference}/videos"), vec![], None).await,
    )
    .await;
    assert_eq!(videos.as_array().unwrap().len(), 1);

    let notifications = json_body(send(&router, "GET", "/notifications", vec![], None).await).await;
    assert_eq!(notifications[0]["submissionId"], id.as_str());
    assert_eq!(notifications[0]["employeeName"], "Jane");

    let resp = send(&router, "DELETE", &format!("/submissions/{id}"), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = send(&router, "DELETE", &format!("/submissions/{id}"), vec![], None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["error"], "Submission not found");
  }

  #[tokio::test]
  async fn submit_legacy_field_names() {
    let (router, store, _) = app().await;
    let mut body = payload_json(None);
    let obj = body.as_object_mut().unwrap();
    obj.remove("referrerRef");
    let raw = obj.remove("rawVideoURL").unwrap();
    obj.insert("rawVideo".into(), raw);
    obj.insert("empRef".into(), json!("legacy"));

    let resp = send(&router, "POST", "/submit-video", vec![], Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let stored = store.list_submissions().await.unwrap();
    assert_eq!(stored[0].referrer_ref.as_deref(), Some("legacy"));
    assert_eq!(stored[0].originating_ip, "Unknown");
  }

  #[tokio::test]
  async fn submit_missing_fields_is_bad_request() {
    let (router, store, mail) = app().await;
    let mut body = payload_json(None);
    body.as_object_mut().unwrap().remove("signature");

    let resp = send(&router, "POST", "/submit-video", vec![], Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let error = json_body(resp).await["error"].as_str().unwrap().to_owned();
    assert!(error.contains("signature"), "{error}");
    assert_eq!(store.count_submissions().await.unwrap(), 0);
    assert!(mail.sent().is_empty());
  }

  #[tokio::test]
  async fn submit_malformed_json_is_bad_request() {
    let (router, _, _) = app().await;
    let req = Request::builder()
      .method("POST")
      .uri("/submit-video")
      .header("content-type", "application/json")
      .body(Body::from("{not json"))
      .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn store_failure_is_server_error() {
    let store = Arc::new(MemoryStore::new());
    store.fail_submission_writes(true);
    let mail = Arc::new(RecordingTransport::new(TransportMode::Deliver));
    let router = public_router(dispatcher(store.clone(), mail.clone()));

    let resp = send(&router, "POST", "/submit-video", vec![], Some(payload_json(None))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["error"], "Internal Server Error");
    assert!(store.list_notifications().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn mail_failure_is_invisible_to_submitter() {
    let store = Arc::new(MemoryStore::new());
    let mail = Arc::new(RecordingTransport::new(TransportMode::Fail));
    let router = public_router(dispatcher(store.clone(), mail));

    let resp = send(&router, "POST", "/submit-video", vec![], Some(payload_json(None))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(store.count_submissions().await.unwrap(), 1);
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn dashboard_summaries() {
    let (router, store, _) = app().await;
    let links = FormLinks::new("https://forms.example.com/submit");
    let jane = store
      .add_employee(NewEmployee { name: "Jane".into(), email: "jane@example.com".into() }, &links)
      .await
      .unwrap();
    let reference = jane.employee_id.to_string();
    for reference in [Some(reference.as_str()), Some(reference.as_str()), None] {
      let resp = send(&router, "POST", "/submit-video", vec![], Some(payload_json(reference))).await;
      assert_eq!(resp.status(), StatusCode::OK);
    }

    let stats = json_body(send(&router, "GET", "/stats", vec![], None).await).await;
    assert_eq!(stats, json!({ "totalVideos": 3, "totalEmployees": 1 }));

    let top = json_body(send(&router, "GET", "/top-employees", vec![], None).await).await;
    assert_eq!(top[0]["empRef"], reference.as_str());
    assert_eq!(top[0]["totalVideos"], 2);
    assert_eq!(top[0]["formLink"], jane.form_link.as_str());

    let recent = json_body(send(&router, "GET", "/recent-submissions", vec![], None).await).await;
    assert_eq!(recent["recentSubmissions"].as_array().unwrap().len(), 3);
  }

  #[tokio::test]
  async fn unknown_notification_is_not_found() {
    let (router, _, _) = app().await;
    let resp = send(
      &router,
      "DELETE",
      &format!("/notifications/{}", Uuid::new_v4()),
      vec![],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
