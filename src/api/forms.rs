//! Booking form API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::forms::FormView;
use crate::models::{DraftField, SetFieldRequest};
use crate::AppState;

/// Request body for mounting a form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountFormRequest {
    /// Stable identifier the browser keeps across page loads.
    #[serde(default)]
    pub client_id: Option<String>,
}

/// POST /api/forms - Mount a new, empty booking form.
pub async fn mount_form(
    State(state): State<AppState>,
    Json(request): Json<MountFormRequest>,
) -> ApiResult<FormView> {
    success(state.forms.mount(request.client_id).await?)
}

/// GET /api/forms/:id - Current state of a form.
pub async fn get_form(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<FormView> {
    success(state.forms.view(id).await?)
}

/// PATCH /api/forms/:id/fields - Change one field of the draft.
pub async fn set_form_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetFieldRequest>,
) -> ApiResult<FormView> {
    let field: DraftField = request.field.parse().map_err(AppError::BadRequest)?;
    success(state.forms.set_field(id, field, request.value).await?)
}

/// POST /api/forms/:id/submit - Validate and submit the draft.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<FormView> {
    success(state.forms.submit(id).await?)
}

/// POST /api/forms/:id/modal/dismiss - Close the confirmation modal.
pub async fn dismiss_modal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<FormView> {
    success(state.forms.dismiss_modal(id).await?)
}

/// DELETE /api/forms/:id - Unmount a form.
pub async fn unmount_form(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.forms.unmount(id).await?;
    success(())
}
