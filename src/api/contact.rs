//! Contact form endpoint.

use axum::Json;

use super::{success, ApiResult};
use crate::models::ContactMessage;
use crate::validation;

/// POST /api/contact - Accept a message from the contact page.
///
/// Messages are not stored; they end up in the service log.
pub async fn send_contact_message(Json(message): Json<ContactMessage>) -> ApiResult<()> {
    validation::validate_contact(&message.email, &message.message)?;

    tracing::info!(
        name = %message.name.trim(),
        email = %message.email.trim(),
        "Contact message: {}",
        message.message.trim()
    );
    success(())
}
