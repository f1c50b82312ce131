//! Booking records exchanged with the booking API.

use serde::{Deserialize, Serialize};

/// A validated, normalized booking ready to be sent to the booking API.
///
/// `id` is left out of the request body when the API issues identifiers itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub telephone: String,
    pub service: String,
    pub date: String,
    pub time: String,
}

impl NewBooking {
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// A booking as stored by the booking API, always carrying its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub telephone: String,
    pub service: String,
    pub date: String,
    pub time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> NewBooking {
        NewBooking {
            id: None,
            name: "Petr".to_string(),
            surname: "Novák".to_string(),
            email: "petr@example.cz".to_string(),
            telephone: "777123456".to_string(),
            service: "Kineziotaping".to_string(),
            date: "2024-06-11".to_string(),
            time: "10:00".to_string(),
        }
    }

    #[test]
    fn test_id_omitted_when_unassigned() {
        let body = serde_json::to_value(booking()).unwrap();
        assert!(body.get("id").is_none());
        assert_eq!(body["telephone"], "777123456");
    }

    #[test]
    fn test_id_sent_when_assigned() {
        let body = serde_json::to_value(booking().with_id(8)).unwrap();
        assert_eq!(body["id"], 8);
    }

    #[test]
    fn test_record_requires_id() {
        let without_id = serde_json::to_value(booking()).unwrap();
        assert!(serde_json::from_value::<BookingRecord>(without_id).is_err());
    }
}
