//! Booking submission workflow.
//!
//! Validate the draft, then hand the normalized booking to the booking API.
//! Form bookkeeping (phases, flags, resets) lives in `forms`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::availability::FormVariant;
use crate::booking_api::{next_identifier, BookingApi, CollaboratorError};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::{BookingDraft, BookingRecord, NewBooking, ServiceCatalog};
use crate::validation::{self, ValidationError};

/// Who chooses the identifier of a new booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdAssignment {
    /// The booking API issues identifiers; the request carries none.
    Collaborator,
    /// Read all bookings and use the highest identifier plus one.
    NextAfterMax,
}

impl FromStr for IdAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collaborator" => Ok(IdAssignment::Collaborator),
            "next-after-max" => Ok(IdAssignment::NextAfterMax),
            other => Err(format!(
                "expected 'collaborator' or 'next-after-max', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for IdAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdAssignment::Collaborator => f.write_str("collaborator"),
            IdAssignment::NextAfterMax => f.write_str("next-after-max"),
        }
    }
}

/// Where a mounted form is in its submission lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormPhase {
    Editing,
    Validating,
    Persisting,
    Confirmed,
    Failed,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error("submission cancelled")]
    Cancelled,
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Invalid(e) => e.into(),
            SubmitError::Collaborator(e) => e.into(),
            SubmitError::Cancelled => AppError::Cancelled,
        }
    }
}

pub struct SubmissionWorkflow {
    api: Arc<dyn BookingApi>,
    catalog: Arc<ServiceCatalog>,
    variant: FormVariant,
    id_assignment: IdAssignment,
    clock: Arc<dyn Clock>,
}

impl SubmissionWorkflow {
    pub fn new(
        api: Arc<dyn BookingApi>,
        catalog: Arc<ServiceCatalog>,
        variant: FormVariant,
        id_assignment: IdAssignment,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            catalog,
            variant,
            id_assignment,
            clock,
        }
    }

    /// Synchronous gate run before anything is sent.
    pub fn validate(&self, draft: &BookingDraft) -> Result<NewBooking, ValidationError> {
        validation::validate_draft(draft, &self.variant, &self.catalog, self.clock.now())
    }

    /// Store a validated booking, giving up as soon as `cancel` fires.
    pub async fn persist(
        &self,
        booking: NewBooking,
        cancel: &CancellationToken,
    ) -> Result<BookingRecord, SubmitError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SubmitError::Cancelled),
            result = self.store(booking) => result.map_err(SubmitError::from),
        }
    }

    /// Validate and persist in one go.
    #[cfg(test)]
    pub async fn submit(
        &self,
        draft: &BookingDraft,
        cancel: &CancellationToken,
    ) -> Result<BookingRecord, SubmitError> {
        let booking = self.validate(draft)?;
        self.persist(booking, cancel).await
    }

    async fn store(&self, booking: NewBooking) -> Result<BookingRecord, CollaboratorError> {
        let booking = match self.id_assignment {
            IdAssignment::Collaborator => booking,
            IdAssignment::NextAfterMax => {
                let existing = self.api.list_bookings().await?;
                booking.with_id(next_identifier(&existing)?)
            }
        };
        self.api.create_booking(&booking).await
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeBookingApi;
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    fn workflow(api: Arc<FakeBookingApi>, id_assignment: IdAssignment) -> SubmissionWorkflow {
        SubmissionWorkflow::new(
            api,
            Arc::new(ServiceCatalog::bundled().unwrap()),
            FormVariant::booking_page(),
            id_assignment,
            Arc::new(ManualClock::parse("2024-06-10 14:20")),
        )
    }

    fn draft() -> BookingDraft {
        BookingDraft {
            id: None,
            name: "Tomáš".to_string(),
            surname: "Svoboda".to_string(),
            email: "tomas@example.cz".to_string(),
            telephone: "721 000 111".to_string(),
            service: "Rázová vlna".to_string(),
            date: "2024-06-10".to_string(),
            time: "16:00".to_string(),
        }
    }

    #[tokio::test]
    async fn test_next_after_max_reads_then_posts_once() {
        let api = Arc::new(FakeBookingApi::with_ids(&[1, 4, 2]));
        let record = workflow(api.clone(), IdAssignment::NextAfterMax)
            .submit(&draft(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(record.id, 5);
        assert_eq!(*api.list_calls.lock().unwrap(), 1);
        let posted = api.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].id, Some(5));
        assert_eq!(posted[0].telephone, "721000111");
    }

    #[tokio::test]
    async fn test_next_after_max_with_exhausted_ids_posts_nothing() {
        let api = Arc::new(FakeBookingApi::with_ids(&[i64::MAX]));
        let err = workflow(api.clone(), IdAssignment::NextAfterMax)
            .submit(&draft(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Collaborator(CollaboratorError::Decode(_))));
        assert!(api.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_collaborator_assignment_skips_listing() {
        let api = Arc::new(FakeBookingApi::with_ids(&[7]));
        let record = workflow(api.clone(), IdAssignment::Collaborator)
            .submit(&draft(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(record.id, 8);
        assert_eq!(*api.list_calls.lock().unwrap(), 0);
        assert_eq!(api.posted.lock().unwrap()[0].id, None);
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_api() {
        let api = Arc::new(FakeBookingApi::default());
        let mut bad = draft();
        bad.email = "tomas.example.cz".to_string();

        let err = workflow(api.clone(), IdAssignment::NextAfterMax)
            .submit(&bad, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Invalid(ValidationError::Email)));
        assert_eq!(*api.list_calls.lock().unwrap(), 0);
        assert!(api.posted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_failure_is_reported() {
        let api = Arc::new(FakeBookingApi {
            fail: true,
            ..FakeBookingApi::default()
        });
        let err = workflow(api, IdAssignment::Collaborator)
            .submit(&draft(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::Collaborator(_)));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_request() {
        let api = Arc::new(FakeBookingApi {
            delay: Some(Duration::from_secs(30)),
            ..FakeBookingApi::default()
        });
        let workflow = workflow(api.clone(), IdAssignment::Collaborator);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = workflow.submit(&draft(), &cancel).await.unwrap_err();
        assert!(matches!(err, SubmitError::Cancelled));
        assert!(api.posted.lock().unwrap().is_empty());
    }

    #[test]
    fn test_id_assignment_parse() {
        assert_eq!(
            "next-after-max".parse::<IdAssignment>().unwrap(),
            IdAssignment::NextAfterMax
        );
        assert!("server".parse::<IdAssignment>().is_err());
    }
}
