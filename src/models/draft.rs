//! Booking draft: the in-progress, unsubmitted form state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A user-editable field of the booking form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Name,
    Surname,
    Email,
    Telephone,
    Service,
    Date,
    Time,
}

impl DraftField {
    pub const ALL: [DraftField; 7] = [
        DraftField::Name,
        DraftField::Surname,
        DraftField::Email,
        DraftField::Telephone,
        DraftField::Service,
        DraftField::Date,
        DraftField::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Surname => "surname",
            DraftField::Email => "email",
            DraftField::Telephone => "telephone",
            DraftField::Service => "service",
            DraftField::Date => "date",
            DraftField::Time => "time",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DraftField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("Unknown form field '{}'", s))
    }
}

/// The booking form as currently filled in by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub telephone: String,
    pub service: String,
    pub date: String,
    pub time: String,
}

impl BookingDraft {
    /// Replace one field, leaving all others untouched. No validation happens here.
    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Name => self.name = value,
            DraftField::Surname => self.surname = value,
            DraftField::Email => self.email = value,
            DraftField::Telephone => self.telephone = value,
            DraftField::Service => self.service = value,
            DraftField::Date => self.date = value,
            DraftField::Time => self.time = value,
        }
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Surname => &self.surname,
            DraftField::Email => &self.email,
            DraftField::Telephone => &self.telephone,
            DraftField::Service => &self.service,
            DraftField::Date => &self.date,
            DraftField::Time => &self.time,
        }
    }

    /// Restore the empty draft a freshly mounted form starts with.
    pub fn reset(&mut self) {
        *self = BookingDraft::default();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        *self == BookingDraft::default()
    }
}

/// Request body for `PATCH /api/forms/{id}/fields`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetFieldRequest {
    pub field: String,
    #[serde(default)]
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_field_preserves_other_fields() {
        let mut draft = BookingDraft::default();
        draft.set_field(DraftField::Name, "Jana");
        draft.set_field(DraftField::Email, "jana@example.cz");
        draft.set_field(DraftField::Name, "Jana Marie");

        assert_eq!(draft.name, "Jana Marie");
        assert_eq!(draft.email, "jana@example.cz");
        assert_eq!(draft.surname, "");
        assert_eq!(draft.id, None);
    }

    #[test]
    fn test_set_field_stores_raw_value() {
        let mut draft = BookingDraft::default();
        draft.set_field(DraftField::Telephone, " 777 123 456 ");
        assert_eq!(draft.get(DraftField::Telephone), " 777 123 456 ");
    }

    #[test]
    fn test_reset_restores_empty_draft() {
        let mut draft = BookingDraft::default();
        for field in DraftField::ALL {
            draft.set_field(field, "x");
        }
        draft.id = Some(3);
        assert!(!draft.is_empty());

        draft.reset();
        assert!(draft.is_empty());
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in DraftField::ALL {
            assert_eq!(field.as_str().parse::<DraftField>().unwrap(), field);
        }
        assert!("id".parse::<DraftField>().is_err());
        assert!("Name".parse::<DraftField>().is_err());
    }
}
