//! Marker left behind by a successful booking submission.

use chrono::NaiveDateTime;

/// Drives the "form submitted" banner for one browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFlag {
    pub client_id: String,
    pub submitted_at: NaiveDateTime,
    pub display_until: NaiveDateTime,
}

impl SubmissionFlag {
    pub fn is_visible_at(&self, now: NaiveDateTime) -> bool {
        now < self.display_until
    }
}
