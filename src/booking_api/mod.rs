//! Client for the external booking REST API.
//!
//! The API owns booking storage: `GET /bookings` lists stored records and
//! `POST /bookings` stores one and echoes it back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::models::{BookingRecord, NewBooking};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("booking API unreachable: {0}")]
    Transport(String),
    #[error("booking API answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("booking API rejected the booking: {0}")]
    Conflict(String),
    #[error("unexpected booking API response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CollaboratorError::Decode(err.to_string())
        } else {
            CollaboratorError::Transport(err.to_string())
        }
    }
}

/// The capabilities the forms need from the booking API.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// All stored bookings, in the API's order.
    async fn list_bookings(&self) -> Result<Vec<BookingRecord>, CollaboratorError>;

    /// Store a booking. When `booking.id` is `None` the API issues the identifier.
    async fn create_booking(&self, booking: &NewBooking)
        -> Result<BookingRecord, CollaboratorError>;
}

/// `BookingApi` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBookingApi {
    client: Client,
    base_url: String,
}

impl HttpBookingApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn bookings_url(&self) -> String {
        format!("{}/bookings", self.base_url)
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_bookings(&self) -> Result<Vec<BookingRecord>, CollaboratorError> {
        let resp = self.client.get(self.bookings_url()).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.json().await?)
    }

    async fn create_booking(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingRecord, CollaboratorError> {
        let resp = self
            .client
            .post(self.bookings_url())
            .json(booking)
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let record: BookingRecord = resp.json().await?;

        tracing::debug!("Booking API stored booking {}", record.id);
        Ok(record)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, CollaboratorError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::CONFLICT {
        return Err(CollaboratorError::Conflict(body));
    }
    Err(CollaboratorError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Legacy identifier scheme: one past the highest identifier already stored.
///
/// Not safe against concurrent submitters; only used when the API cannot issue ids.
pub fn next_identifier(existing: &[BookingRecord]) -> Result<i64, CollaboratorError> {
    let max = existing.iter().map(|b| b.id).max().unwrap_or(0);
    max.checked_add(1)
        .ok_or_else(|| CollaboratorError::Decode(format!("no identifier left after {}", max)))
}
