//! Availability endpoint.

use axum::extract::{Query, State};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::availability::{self, Availability};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
}

/// GET /api/availability?date=YYYY-MM-DD - Selectable slots for a date.
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<Availability> {
    let now = state.clock.now();

    let date = match query.date.as_deref() {
        None | Some("") => now.date(),
        Some(raw) => availability::parse_date(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date '{}'", raw)))?,
    };

    success(Availability::compute(&state.config.variant, date, now))
}
