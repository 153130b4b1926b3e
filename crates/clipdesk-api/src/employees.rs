//! Handlers for `/employees` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/employees` | Creation order |
//! | `POST`   | `/employees` | Body: `{"name":"…","email":"…"}`; 409 on duplicate email |
//! | `GET`    | `/employees/:id` | 404 if not found |
//! | `PUT`    | `/employees/:id` | Partial update |
//! | `DELETE` | `/employees/:id` | Submissions keep their reference |
//! | `GET`    | `/employees/:id/videos` | Submissions made through this employee's link |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use clipdesk_core::{
  referrer::{Employee, EmployeeUpdate, NewEmployee},
  reports::{self, EmployeeVideo},
  store::DashboardStore,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AdminState, error::ApiError};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("employee {id} not found")) }

/// `GET /employees`
pub async fn list<S: DashboardStore>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Employee>>, ApiError> {
  let employees = store.list_employees().await.map_err(ApiError::store)?;
  Ok(Json(employees))
}

/// `POST /employees`
pub async fn create<S: DashboardStore>(
  State(state): State<AdminState<S>>,
  Json(body): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError> {
  let employee = state
    .store
    .add_employee(body, &state.links)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(employee_id = %employee.employee_id, "employee created");
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Employee created successfully",
      "formLink": employee.form_link,
      "employee": employee,
    })),
  ))
}

/// `GET /employees/:id`
pub async fn get_one<S: DashboardStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError> {
  let employee = store
    .get_employee(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(employee))
}

/// `PUT /employees/:id`
pub async fn update<S: DashboardStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<EmployeeUpdate>,
) -> Result<Json<Employee>, ApiError> {
  let employee = store
    .update_employee(id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(employee))
}

/// `DELETE /employees/:id`
pub async fn delete<S: DashboardStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  if !store.delete_employee(id).await.map_err(ApiError::store)? {
    return Err(not_found(id));
  }
  tracing::info!(employee_id = %id, "employee deleted");
  Ok(Json(json!({ "message": "Employee deleted successfully" })))
}

/// `GET /employees/:id/videos`
pub async fn videos<S: DashboardStore>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<EmployeeVideo>>, ApiError> {
  let videos = reports::employee_videos(store.as_ref(), id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(videos))
}
