//! Submission flag endpoints.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::AppState;

/// DELETE /api/sessions/:client_id/flag - Forget the "just submitted" flag.
pub async fn clear_submission_flag(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> ApiResult<bool> {
    success(state.flags.clear(&client_id).await?)
}
