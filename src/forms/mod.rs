//! Mounted booking forms.
//!
//! Each browser page that shows the booking form mounts one `FormSession`. The
//! store keeps the draft, the error flags and the submission phase per form and
//! drives the submission workflow. A form's lock is never held while the
//! booking API is being called.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::{BookingDraft, BookingRecord, DraftField, NewBooking};
use crate::session::SessionFlags;
use crate::validation::ValidationError;
use crate::workflow::{FormPhase, SubmissionWorkflow, SubmitError};

/// State of one mounted form.
#[derive(Debug)]
pub struct FormSession {
    pub id: Uuid,
    pub client_id: String,
    pub draft: BookingDraft,
    pub phase: FormPhase,
    pub error: Option<ValidationError>,
    pub failure: Option<String>,
    pub show_modal: bool,
    pub booking: Option<BookingRecord>,
    pub touched_at: NaiveDateTime,
}

impl FormSession {
    fn new(client_id: String, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id,
            draft: BookingDraft::default(),
            phase: FormPhase::Editing,
            error: None,
            failure: None,
            show_modal: false,
            booking: None,
            touched_at: now,
        }
    }

    fn view(&self, show_banner: bool) -> FormView {
        FormView {
            form_id: self.id,
            client_id: self.client_id.clone(),
            draft: self.draft.clone(),
            phase: self.phase,
            telephone_error: self.error == Some(ValidationError::Telephone),
            email_error: self.error == Some(ValidationError::Email),
            field_error: self.error.as_ref().map(|e| FieldErrorView {
                field: e.field(),
                message: e.to_string(),
            }),
            failure: self.failure.clone(),
            show_modal: self.show_modal,
            show_banner,
            booking: self.booking.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldErrorView {
    pub field: DraftField,
    pub message: String,
}

/// What the browser renders for a mounted form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub form_id: Uuid,
    pub client_id: String,
    pub draft: BookingDraft,
    pub phase: FormPhase,
    pub telephone_error: bool,
    pub email_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_error: Option<FieldErrorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub show_modal: bool,
    pub show_banner: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingRecord>,
}

/// A registered form. The token lives outside the lock so unmounting never waits.
struct FormEntry {
    cancel: CancellationToken,
    session: Mutex<FormSession>,
}

pub struct FormStore {
    forms: RwLock<HashMap<Uuid, Arc<FormEntry>>>,
    workflow: Arc<SubmissionWorkflow>,
    flags: Arc<SessionFlags>,
    clock: Arc<dyn Clock>,
}

impl FormStore {
    pub fn new(
        workflow: SubmissionWorkflow,
        flags: Arc<SessionFlags>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            forms: RwLock::new(HashMap::new()),
            workflow: Arc::new(workflow),
            flags,
            clock,
        }
    }

    /// Mount a fresh, empty form for a browser. The browser's submission flag is loaded here.
    pub async fn mount(&self, client_id: Option<String>) -> Result<FormView, AppError> {
        let client_id = client_id
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let show_banner = self.flags.banner_visible(&client_id).await?;
        let form = FormSession::new(client_id, self.clock.now());
        let view = form.view(show_banner);

        let entry = FormEntry {
            cancel: CancellationToken::new(),
            session: Mutex::new(form),
        };
        self.forms
            .write()
            .await
            .insert(view.form_id, Arc::new(entry));

        tracing::debug!("Mounted form {} for client {}", view.form_id, view.client_id);
        Ok(view)
    }

    pub async fn view(&self, id: Uuid) -> Result<FormView, AppError> {
        let entry = self.get(id).await?;
        let form = entry.session.lock().await;
        let show_banner = self.flags.banner_visible(&form.client_id).await?;
        Ok(form.view(show_banner))
    }

    /// Replace one draft field. Typing never blocks, even while a submission is in flight.
    pub async fn set_field(
        &self,
        id: Uuid,
        field: DraftField,
        value: String,
    ) -> Result<FormView, AppError> {
        let entry = self.get(id).await?;
        let mut form = entry.session.lock().await;

        form.draft.set_field(field, value);
        form.touched_at = self.clock.now();
        if form.phase != FormPhase::Persisting {
            form.phase = FormPhase::Editing;
        }

        let show_banner = self.flags.banner_visible(&form.client_id).await?;
        Ok(form.view(show_banner))
    }

    pub async fn dismiss_modal(&self, id: Uuid) -> Result<FormView, AppError> {
        let entry = self.get(id).await?;
        let mut form = entry.session.lock().await;
        form.show_modal = false;

        let show_banner = self.flags.banner_visible(&form.client_id).await?;
        Ok(form.view(show_banner))
    }

    /// Validate the draft and store it through the booking API.
    ///
    /// Validation failures keep the draft and raise an error flag. API failures keep the
    /// draft and mark the form `Failed`. Success resets the draft, opens the
    /// confirmation modal and sets the browser's submission flag.
    pub async fn submit(&self, id: Uuid) -> Result<FormView, AppError> {
        let entry = self.get(id).await?;

        let booking = {
            let mut form = entry.session.lock().await;
            if form.phase == FormPhase::Persisting {
                return Err(AppError::SubmissionInProgress);
            }

            form.phase = FormPhase::Validating;
            form.touched_at = self.clock.now();
            match self.workflow.validate(&form.draft) {
                Ok(booking) => {
                    form.error = None;
                    form.failure = None;
                    form.phase = FormPhase::Persisting;
                    booking
                }
                Err(e) => {
                    tracing::debug!("Form {} failed validation: {}", id, e);
                    form.error = Some(e.clone());
                    form.phase = FormPhase::Editing;
                    return Err(e.into());
                }
            }
        };

        // The request may be dropped by a disconnecting client; the spawned task still
        // takes the form out of `Persisting`.
        let task = tokio::spawn(complete_submission(
            entry.clone(),
            booking,
            self.workflow.clone(),
            self.flags.clone(),
        ));
        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Submission task for form {} failed: {}", id, e);
                let mut form = entry.session.lock().await;
                form.phase = FormPhase::Failed;
                form.failure = Some("submission aborted".to_string());
                Err(AppError::Internal(format!("Submission for form {} aborted", id)))
            }
        }
    }

    /// Unmount a form, cancelling any submission still in flight.
    pub async fn unmount(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self.forms.write().await.remove(&id);
        let Some(entry) = removed else {
            return Err(not_found(id));
        };

        entry.cancel.cancel();
        tracing::debug!("Unmounted form {}", id);
        Ok(())
    }

    /// Drop forms nobody has touched for `idle_for`.
    pub async fn prune_idle(&self, idle_for: chrono::Duration) -> usize {
        let idle_since = self.clock.now() - idle_for;
        let mut forms = self.forms.write().await;
        let mut stale = Vec::new();
        for (id, entry) in forms.iter() {
            // A form that is locked right now is in use. A submission that has been
            // persisting for the whole idle window is cancelled along with the form.
            if let Ok(form) = entry.session.try_lock() {
                if form.touched_at < idle_since {
                    stale.push(*id);
                }
            }
        }
        for id in &stale {
            if let Some(entry) = forms.remove(id) {
                entry.cancel.cancel();
            }
        }
        stale.len()
    }

    pub async fn len(&self) -> usize {
        self.forms.read().await.len()
    }

    async fn get(&self, id: Uuid) -> Result<Arc<FormEntry>, AppError> {
        self.forms
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Form {} not found", id))
}

/// Persist a validated booking and record the outcome on the form.
async fn complete_submission(
    entry: Arc<FormEntry>,
    booking: NewBooking,
    workflow: Arc<SubmissionWorkflow>,
    flags: Arc<SessionFlags>,
) -> Result<FormView, AppError> {
    let result = workflow.persist(booking, &entry.cancel).await;

    let mut form = entry.session.lock().await;
    match result {
        Ok(record) => {
            tracing::info!(
                "Booking {} confirmed for {} at {}",
                record.id,
                record.date,
                record.time
            );
            // The booking is already stored; a missing flag only hides the banner.
            if let Err(e) = flags.mark_submitted(&form.client_id).await {
                tracing::warn!("Could not set submission flag for {}: {}", form.client_id, e);
            }
            form.phase = FormPhase::Confirmed;
            form.show_modal = true;
            form.booking = Some(record);
            form.draft.reset();
            form.error = None;
            form.failure = None;

            let show_banner = flags
                .banner_visible(&form.client_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("Could not read submission flag for {}: {}", form.client_id, e);
                    false
                });
            Ok(form.view(show_banner))
        }
        Err(SubmitError::Cancelled) => {
            tracing::info!("Submission for form {} cancelled", form.id);
            form.phase = FormPhase::Editing;
            Err(AppError::Cancelled)
        }
        Err(e) => {
            tracing::error!("Booking submission for form {} failed: {}", form.id, e);
            form.phase = FormPhase::Failed;
            form.failure = Some(e.to_string());
            Err(e.into())
        }
    }
}

/// Periodically unmount abandoned forms until `cancel` fires.
pub fn spawn_idle_pruner(
    store: Arc<FormStore>,
    idle_for: chrono::Duration,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let pruned = store.prune_idle(idle_for).await;
                    if pruned > 0 {
                        tracing::debug!(
                            "Unmounted {} idle forms, {} still mounted",
                            pruned,
                            store.len().await
                        );
                    }
                }
            }
        }
    })
}
