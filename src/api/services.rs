//! Service catalog endpoint.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::Service;
use crate::AppState;

/// GET /api/services - List the bookable services.
pub async fn list_services(State(state): State<AppState>) -> ApiResult<Vec<Service>> {
    success(state.catalog.services().to_vec())
}
