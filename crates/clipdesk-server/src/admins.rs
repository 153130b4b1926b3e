//! Handlers for `/admins` endpoints.
//!
//! These live beside the session code rather than in `clipdesk-api` because
//! creating an admin means hashing a password.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use clipdesk_api::ApiError;
use clipdesk_core::{
  referrer::{Admin, AdminUpdate, NewAdmin},
  store::DashboardStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, auth, error::Error};

fn not_found(id: Uuid) -> Error { ApiError::NotFound(format!("admin {id} not found")).into() }

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdmin {
  #[serde(default)]
  pub email:        String,
  #[serde(default)]
  pub password:     String,
  pub display_name: Option<String>,
}

/// `GET /admins`
pub async fn list<S: DashboardStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Admin>>, Error> {
  Ok(Json(state.store.list_admins().await.map_err(ApiError::store)?))
}

/// `POST /admins`
pub async fn create<S: DashboardStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateAdmin>,
) -> Result<impl IntoResponse, Error> {
  // An empty hash is what `NewAdmin::validate` reports as a missing password.
  let password_hash = if body.password.is_empty() {
    String::new()
  } else {
    auth::hash_password(&body.password)?
  };

  let admin = state
    .store
    .add_admin(
      NewAdmin { email: body.email, password_hash, display_name: body.display_name },
      &state.links,
    )
    .await
    .map_err(ApiError::store)?;
  tracing::info!(admin_id = %admin.admin_id, "admin created");
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Admin created successfully",
      "formLink": admin.form_link,
      "admin": admin,
    })),
  ))
}

/// `PUT /admins/:id`
pub async fn update<S: DashboardStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AdminUpdate>,
) -> Result<Json<Admin>, Error> {
  let admin = state
    .store
    .update_admin(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(admin))
}

/// `DELETE /admins/:id`
pub async fn delete<S: DashboardStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, Error> {
  if !state.store.delete_admin(id).await.map_err(ApiError::store)? {
    return Err(not_found(id));
  }
  tracing::info!(admin_id = %id, "admin deleted");
  Ok(Json(json!({ "message": "Admin deleted successfully" })))
}
