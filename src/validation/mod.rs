//! Draft validation.
//!
//! The telephone check runs before the e-mail check, so at most one of the two
//! error flags is raised for a submission.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::availability::{self, FormVariant};
use crate::models::{BookingDraft, DraftField, NewBooking, ServiceCatalog};

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid e-mail pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter a valid phone number (digits only, no country code)")]
    Telephone,
    #[error("Enter a valid e-mail address")]
    Email,
    #[error("Field '{0}' is required")]
    Required(DraftField),
    #[error("Unknown service '{0}'")]
    UnknownService(String),
    #[error("Date '{0}' cannot be booked")]
    DateUnavailable(String),
    #[error("Time '{0}' is not available")]
    TimeUnavailable(String),
}

impl ValidationError {
    pub fn field(&self) -> DraftField {
        match self {
            ValidationError::Telephone => DraftField::Telephone,
            ValidationError::Email => DraftField::Email,
            ValidationError::Required(field) => *field,
            ValidationError::UnknownService(_) => DraftField::Service,
            ValidationError::DateUnavailable(_) => DraftField::Date,
            ValidationError::TimeUnavailable(_) => DraftField::Time,
        }
    }
}

/// Permissive single-dot e-mail shape check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Remove every whitespace character, including the ones between digit groups.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Digits only, at most `max_digits` of them, after whitespace is stripped.
pub fn is_valid_phone(phone: &str, max_digits: usize) -> bool {
    let digits = normalize_phone(phone);
    !digits.is_empty() && digits.len() <= max_digits && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Check a draft and produce the normalized booking to submit.
pub fn validate_draft(
    draft: &BookingDraft,
    variant: &FormVariant,
    catalog: &ServiceCatalog,
    now: NaiveDateTime,
) -> Result<NewBooking, ValidationError> {
    if !is_valid_phone(&draft.telephone, variant.max_phone_digits) {
        return Err(ValidationError::Telephone);
    }
    if !is_valid_email(&draft.email) {
        return Err(ValidationError::Email);
    }

    for field in [
        DraftField::Name,
        DraftField::Surname,
        DraftField::Service,
        DraftField::Date,
        DraftField::Time,
    ] {
        if draft.get(field).trim().is_empty() {
            return Err(ValidationError::Required(field));
        }
    }

    let service = draft.service.trim();
    if !catalog.contains(service) {
        return Err(ValidationError::UnknownService(service.to_string()));
    }

    let date = availability::parse_date(&draft.date)
        .filter(|date| variant.is_selectable(*date, now.date()))
        .ok_or_else(|| ValidationError::DateUnavailable(draft.date.trim().to_string()))?;

    availability::parse_slot(&draft.time)
        .filter(|slot| variant.available_slots(date, now).contains(slot))
        .ok_or_else(|| ValidationError::TimeUnavailable(draft.time.trim().to_string()))?;

    Ok(NewBooking {
        id: None,
        name: draft.name.trim().to_string(),
        surname: draft.surname.trim().to_string(),
        email: draft.email.trim().to_string(),
        telephone: normalize_phone(&draft.telephone),
        service: service.to_string(),
        date: draft.date.trim().to_string(),
        time: draft.time.trim().to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactError {
    #[error("Enter a valid e-mail address")]
    Email,
    #[error("The message must not be empty")]
    EmptyMessage,
}

impl ContactError {
    pub fn field(&self) -> &'static str {
        match self {
            ContactError::Email => "email",
            ContactError::EmptyMessage => "message",
        }
    }
}

/// Contact messages only need a reachable sender and some text.
pub fn validate_contact(email: &str, message: &str) -> Result<(), ContactError> {
    if !is_valid_email(email) {
        return Err(ContactError::Email);
    }
    if message.trim().is_empty() {
        return Err(ContactError::EmptyMessage);
    }
    Ok(())
}
