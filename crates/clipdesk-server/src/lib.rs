//! Deployable HTTP server for the clipdesk dashboard.
//!
//! Wraps the [`clipdesk_api`] routers with admin sessions, the allowed-origin
//! guard for the public form, CORS, and request tracing, and supplies the
//! concrete mail transport, signature artifact store, and upload presigner.

pub mod admins;
pub mod artifacts;
pub mod auth;
pub mod error;
pub mod mail;
pub mod uploads;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::{Request, State},
  http::{HeaderValue, Method, header},
  middleware::{self, Next},
  response::Response,
  routing::{get, post, put},
};
use clipdesk_core::{
  dispatch::{DispatchConfig, Dispatcher},
  referrer::FormLinks,
  store::DashboardStore,
};
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

use artifacts::FsArtifactStore;
use auth::AuthConfig;
use mail::{MailConfig, MailError, Mailer};
use uploads::{UploadConfig, Uploads};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_session_ttl() -> u64 { 3600 }

fn default_artifact_dir() -> PathBuf { PathBuf::from("signatures") }

/// Runtime server configuration, deserialised from `config.toml` and
/// `CLIPDESK__*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Base of every referrer's form link: `<form_base_url>/<id>`.
  pub form_base_url:    String,
  /// Fixed recipient of the full submission summary.
  pub operator_email:   String,
  /// Origins allowed to call the public endpoints.
  #[serde(default)]
  pub allowed_origins:  Vec<String>,
  pub jwt_secret:       String,
  #[serde(default = "default_session_ttl")]
  pub session_ttl_secs: u64,
  #[serde(default = "default_artifact_dir")]
  pub artifact_dir:     PathBuf,
  pub mail:             MailConfig,
  #[serde(default)]
  pub uploads:          Option<UploadConfig>,
}

impl ServerConfig {
  fn origin_allowed(&self, origin: &str) -> bool {
    self.allowed_origins.iter().any(|o| o == origin)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

pub type AppDispatcher<S> = Dispatcher<S, Mailer, FsArtifactStore>;

/// Shared state threaded through the server's own handlers and middleware.
pub struct AppState<S> {
  pub store:      Arc<S>,
  pub dispatcher: Arc<AppDispatcher<S>>,
  pub config:     Arc<ServerConfig>,
  pub auth:       Arc<AuthConfig>,
  pub links:      Arc<FormLinks>,
  /// `None` when no bucket is configured.
  pub uploads:    Option<Arc<Uploads>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      dispatcher: self.dispatcher.clone(),
      config:     self.config.clone(),
      auth:       self.auth.clone(),
      links:      self.links.clone(),
      uploads:    self.uploads.clone(),
    }
  }
}

impl<S: DashboardStore> AppState<S> {
  /// Wire the collaborators described by `config` around `store`.
  pub fn new(store: Arc<S>, config: ServerConfig) -> Result<Self, MailError> {
    let mailer = Mailer::from_config(&config.mail)?;
    let dispatcher = Dispatcher::new(
      store.clone(),
      Arc::new(mailer),
      Arc::new(FsArtifactStore::new(&config.artifact_dir)),
      DispatchConfig {
        operator_email: config.operator_email.clone(),
        sender:         config.mail.sender.clone(),
        mail_timeout:   Duration::from_secs(config.mail.timeout_secs),
      },
    );

    Ok(Self {
      store,
      dispatcher: Arc::new(dispatcher),
      auth: Arc::new(AuthConfig {
        jwt_secret:  config.jwt_secret.clone(),
        session_ttl: Duration::from_secs(config.session_ttl_secs),
      }),
      links: Arc::new(FormLinks::new(config.form_base_url.clone())),
      uploads: config.uploads.as_ref().map(|u| Arc::new(Uploads::new(u))),
      config: Arc::new(config),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application [`Router`], with every route under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DashboardStore + 'static,
{
  let admin = clipdesk_api::admin_router(state.store.clone(), state.links.clone())
    .merge(
      Router::new()
        .route("/admins", get(admins::list::<S>).post(admins::create::<S>))
        .route("/admins/{id}", put(admins::update::<S>).delete(admins::delete::<S>))
        .with_state(state.clone()),
    )
    .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin::<S>));

  let public = clipdesk_api::public_router(state.dispatcher.clone())
    .merge(
      Router::new()
        .route("/upload-url", get(uploads::upload_url::<S>))
        .with_state(state.clone()),
    )
    .route_layer(middleware::from_fn_with_state(state.clone(), require_allowed_origin::<S>));

  let login = Router::new()
    .route("/users/login", post(auth::login::<S>))
    .with_state(state.clone());

  Router::new()
    .nest("/api", admin.merge(public).merge(login))
    .layer(cors(&state.config))
    .layer(middleware::from_fn_with_state(state.config.clone(), reject_foreign_preflight))
    .layer(TraceLayer::new_for_http())
}

fn cors(config: &ServerConfig) -> CorsLayer {
  let origins: Vec<HeaderValue> = config
    .allowed_origins
    .iter()
    .filter_map(|o| match o.parse() {
      Ok(v) => Some(v),
      Err(_) => {
        tracing::warn!(origin = %o, "ignoring unparseable allowed origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Answer CORS preflights from origins off the allow list with 403 instead of
/// letting `CorsLayer` reply 200 without an allow header.
async fn reject_foreign_preflight(
  State(config): State<Arc<ServerConfig>>,
  req: Request,
  next: Next,
) -> Result<Response, Error> {
  let is_preflight = req.method() == Method::OPTIONS
    && req.headers().contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);
  if is_preflight {
    let origin = req
      .headers()
      .get(header::ORIGIN)
      .and_then(|v| v.to_str().ok());
    if !origin.is_some_and(|o| config.origin_allowed(o)) {
      tracing::warn!(origin = ?origin, path = %req.uri().path(), "blocked preflight from disallowed origin");
      return Err(Error::Forbidden);
    }
  }
  Ok(next.run(req).await)
}

/// Reject public requests whose `Origin` is missing or not allowed.
async fn require_allowed_origin<S>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: DashboardStore + 'static,
{
  let origin = req
    .headers()
    .get(header::ORIGIN)
    .and_then(|v| v.to_str().ok());

  match origin {
    Some(o) if state.config.origin_allowed(o) => Ok(next.run(req).await),
    _ => {
      tracing::warn!(origin = ?origin, path = %req.uri().path(), "blocked request from disallowed origin");
      Err(Error::Forbidden)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use clipdesk_core::{memory::SAMPLE_SIGNATURE, referrer::NewAdmin};
  use clipdesk_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::mail::TransportKind;

  const ORIGIN: &str = "https://forms.example.com";

  fn config() -> ServerConfig {
    ServerConfig {
      host:             "127.0.0.1".to_string(),
      port:             5000,
      store_path:       PathBuf::from(":memory:"),
      form_base_url:    "https://forms.example.com/submit".to_string(),
      operator_email:   "ops@example.com".to_string(),
      allowed_origins:  vec![ORIGIN.to_string()],
      jwt_secret:       "test-secret".to_string(),
      session_ttl_secs: 3600,
      artifact_dir:     std::env::temp_dir().join(format!("clipdesk-{}", Uuid::new_v4())),
      mail:             MailConfig {
        transport:    TransportKind::Log,
        endpoint:     None,
        api_key:      None,
        sender:       "noreply@example.com".to_string(),
        timeout_secs: 5,
      },
      uploads:          None,
    }
  }

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let state = AppState::new(store, config()).unwrap();
    state
      .store
      .add_admin(
        NewAdmin {
          email:         "root@example.com".into(),
          password_hash: auth::hash_password(password).unwrap(),
          display_name:  Some("Root".into()),
        },
        &state.links,
      )
      .await
      .unwrap();
    state
  }

  async fn oneshot_raw(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    headers: Vec<(&str, String)>,
    body: Option<Value>,
  ) -> axum::response::Response {
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
    router(state).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn login(state: &AppState<SqliteStore>, password: &str) -> axum::response::Response {
    oneshot_raw(
      state.clone(),
      "POST",
      "/api/users/login",
      vec![],
      Some(json!({ "email": "root@example.com", "password": password })),
    )
    .await
  }

  async fn token(state: &AppState<SqliteStore>) -> String {
    let body = json_body(login(state, "secret").await).await;
    body["token"].as_str().unwrap().to_owned()
  }

  fn bearer(token: &str) -> (&'static str, String) { ("authorization", format!("Bearer {token}")) }

  fn submission() -> Value {
    json!({
      "title": "Cat on a skateboard",
      "videoURL": "https://cdn.example.com/v.mp4",
      "rawVideoURL": "https://cdn.example.com/raw.mp4",
      "firstName": "Ada",
      "socialHandle": "@ada",
      "lastName": "Lovelace",
      "email": "ada@example.com",
      "country": "UK",
      "recordedVideo": true,
      "recordedBy": "Me",
      "submittedElsewhere": "No",
      "notUploadedElsewhere": true,
      "agreed18": true,
      "agreedTerms": true,
      "exclusiveRights": true,
      "signature": SAMPLE_SIGNATURE,
    })
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn login_returns_token_and_admin() {
    let state = make_state("secret").await;
    let resp = login(&state, "secret").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["token"].is_string());
    assert_eq!(body["admin"]["email"], "root@example.com");
    assert!(body["admin"]["formLink"].as_str().unwrap().starts_with("https://forms.example.com/submit/"));
    assert!(body["admin"].get("passwordHash").is_none());
  }

  #[tokio::test]
  async fn wrong_password_is_rejected() {
    let state = make_state("secret").await;
    let resp = login(&state, "wrong").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"], "Invalid credentials");
  }

  #[tokio::test]
  async fn unknown_email_is_rejected() {
    let state = make_state("secret").await;
    let resp = oneshot_raw(
      state,
      "POST",
      "/api/users/login",
      vec![],
      Some(json!({ "email": "nobody@example.com", "password": "secret" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn admin_routes_require_token() {
    let state = make_state("secret").await;

    let resp = oneshot_raw(state.clone(), "GET", "/api/employees", vec![], None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = oneshot_raw(
      state.clone(),
      "GET",
      "/api/employees",
      vec![bearer("not-a-jwt")],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let token = token(&state).await;
    let resp = oneshot_raw(state, "GET", "/api/stats", vec![bearer(&token)], None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["totalVideos"], 0);
  }

  #[tokio::test]
  async fn token_for_deleted_admin_is_rejected() {
    let state = make_state("secret").await;
    let token = token(&state).await;
    let admin = state
      .store
      .find_admin_by_email("root@example.com")
      .await
      .unwrap()
      .unwrap();
    state.store.delete_admin(admin.admin_id).await.unwrap();

    let resp = oneshot_raw(state, "GET", "/api/submissions", vec![bearer(&token)], None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Admin management ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_crud() {
    let state = make_state("secret").await;
    let token = token(&state).await;

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/admins",
      vec![bearer(&token)],
      Some(json!({ "email": "second@example.com", "password": "pw", "displayName": "Second" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    let id = created["admin"]["id"].as_str().unwrap().to_owned();
    assert_eq!(created["formLink"], format!("https://forms.example.com/submit/{id}"));

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/admins",
      vec![bearer(&token)],
      Some(json!({ "email": "second@example.com", "password": "pw" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/admins",
      vec![bearer(&token)],
      Some(json!({ "email": "third@example.com" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = oneshot_raw(
      state.clone(),
      "PUT",
      &format!("/api/admins/{id}"),
      vec![bearer(&token)],
      Some(json!({ "displayName": "Deputy" })),
    )
    .await;
    assert_eq!(json_body(resp).await["displayName"], "Deputy");

    let list = json_body(oneshot_raw(state.clone(), "GET", "/api/admins", vec![bearer(&token)], None).await).await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let resp = oneshot_raw(
      state.clone(),
      "DELETE",
      &format!("/api/admins/{id}"),
      vec![bearer(&token)],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = oneshot_raw(
      state,
      "DELETE",
      &format!("/api/admins/{id}"),
      vec![bearer(&token)],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Public form ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn submit_requires_allowed_origin() {
    let state = make_state("secret").await;

    let resp = oneshot_raw(state.clone(), "POST", "/api/submit-video", vec![], Some(submission())).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(json_body(resp).await["error"], "Forbidden");

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/submit-video",
      vec![("origin", "https://evil.example.com".into())],
      Some(submission()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(state.store.count_submissions().await.unwrap(), 0);

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/submit-video",
      vec![("origin", ORIGIN.into())],
      Some(submission()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get("access-control-allow-origin").unwrap(),
      ORIGIN
    );
    assert_eq!(state.store.count_submissions().await.unwrap(), 1);
    assert_eq!(state.store.list_notifications().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn preflight_is_answered_for_allowed_origin() {
    let state = make_state("secret").await;
    let resp = oneshot_raw(
      state,
      "OPTIONS",
      "/api/submit-video",
      vec![
        ("origin", ORIGIN.into()),
        ("access-control-request-method", "POST".into()),
      ],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get("access-control-allow-origin").unwrap(),
      ORIGIN
    );
  }

  #[tokio::test]
  async fn preflight_from_disallowed_origin_is_forbidden() {
    let state = make_state("secret").await;
    let resp = oneshot_raw(
      state,
      "OPTIONS",
      "/api/submit-video",
      vec![
        ("origin", "https://evil.example.com".into()),
        ("access-control-request-method", "POST".into()),
      ],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(resp.headers().get("access-control-allow-origin").is_none());
    assert_eq!(json_body(resp).await["error"], "Forbidden");
  }

  #[tokio::test]
  async fn upload_url_without_bucket_is_unavailable() {
    let state = make_state("secret").await;
    let resp = oneshot_raw(
      state,
      "GET",
      "/api/upload-url",
      vec![("origin", ORIGIN.into())],
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
  }
}
