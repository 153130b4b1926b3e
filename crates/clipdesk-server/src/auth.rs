//! Admin sessions: argon2 password checks, HS256 session tokens, the login
//! handler, and the middleware guarding the admin routes.

use std::time::Duration;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use clipdesk_api::ApiError;
use clipdesk_core::store::DashboardStore;
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, get_current_timestamp,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::Error};

/// Session signing parameters.
#[derive(Clone)]
pub struct AuthConfig {
  pub jwt_secret:  String,
  pub session_ttl: Duration,
}

/// Session token payload. `sub` is the admin id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  pub iat: u64,
  pub exp: u64,
}

impl AuthConfig {
  /// Sign a session token for `admin_id`, valid for [`Self::session_ttl`].
  pub fn issue(&self, admin_id: Uuid) -> Result<String, Error> {
    let now = get_current_timestamp();
    let claims = Claims { sub: admin_id, iat: now, exp: now + self.session_ttl.as_secs() };
    let token = jsonwebtoken::encode(
      &Header::new(Algorithm::HS256),
      &claims,
      &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
    )?;
    Ok(token)
  }

  /// Check a token's signature and expiry.
  pub fn verify(&self, token: &str) -> Result<Claims, Error> {
    jsonwebtoken::decode::<Claims>(
      token,
      &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
      &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
      tracing::debug!(error = %e, "rejected session token");
      Error::Unauthorized
    })
  }
}

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// `true` if `password` matches the PHC string `hash`.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
  #[serde(default)]
  pub email:    String,
  #[serde(default)]
  pub password: String,
}

/// `POST /users/login`
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login<S: DashboardStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, Error> {
  let admin = state
    .store
    .find_admin_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .filter(|admin| verify_password(&body.password, &admin.password_hash))
    .ok_or_else(|| {
      tracing::info!(email = %body.email, "failed login");
      Error::InvalidCredentials
    })?;

  let token = state.auth.issue(admin.admin_id)?;
  tracing::info!(admin_id = %admin.admin_id, "admin logged in");
  Ok(Json(json!({
    "token": token,
    "admin": {
      "id":        admin.admin_id,
      "email":     admin.email,
      "formLink":  admin.form_link,
      "createdAt": admin.created_at,
    },
  })))
}

// ─── Guard ────────────────────────────────────────────────────────────────────

/// Middleware admitting only requests bearing a valid session token for an
/// admin that still exists.
pub async fn require_admin<S>(
  State(state): State<AppState<S>>,
  req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: DashboardStore + 'static,
{
  let token = bearer_token(req.headers()).ok_or(Error::Unauthorized)?;
  let claims = state.auth.verify(token)?;
  let admin = state
    .store
    .get_admin(claims.sub)
    .await
    .map_err(ApiError::store)?
    .ok_or(Error::Unauthorized)?;
  tracing::debug!(admin_id = %admin.admin_id, path = %req.uri().path(), "admin request");
  Ok(next.run(req).await)
}
