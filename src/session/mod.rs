//! Per-browser "just submitted" state.
//!
//! A flag is written when a booking is confirmed and shown as a banner until its
//! display window ends. Expired flags are dropped when read (the next page load)
//! and by a periodic sweeper. Navigating away clears a flag early.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::db::Repository;
use crate::errors::AppError;
use crate::models::SubmissionFlag;

pub struct SessionFlags {
    repo: Arc<Repository>,
    clock: Arc<dyn Clock>,
    display_for: chrono::Duration,
}

impl SessionFlags {
    pub fn new(repo: Arc<Repository>, clock: Arc<dyn Clock>, display_for: Duration) -> Self {
        let display_for = chrono::Duration::from_std(display_for)
            .unwrap_or_else(|_| chrono::Duration::seconds(5));
        Self {
            repo,
            clock,
            display_for,
        }
    }

    /// Record a confirmed submission for `client_id`.
    pub async fn mark_submitted(&self, client_id: &str) -> Result<(), AppError> {
        let now = self.clock.now();
        let flag = SubmissionFlag {
            client_id: client_id.to_string(),
            submitted_at: now,
            display_until: now + self.display_for,
        };
        self.repo.upsert_flag(&flag).await?;

        tracing::debug!("Submission flag set for client {}", client_id);
        Ok(())
    }

    /// Whether the banner should show right now. An expired flag is removed.
    pub async fn banner_visible(&self, client_id: &str) -> Result<bool, AppError> {
        let Some(flag) = self.repo.get_flag(client_id).await? else {
            return Ok(false);
        };

        if flag.is_visible_at(self.clock.now()) {
            return Ok(true);
        }

        self.repo.delete_flag(client_id).await?;
        Ok(false)
    }

    /// Drop the flag early, e.g. when the client navigates away.
    pub async fn clear(&self, client_id: &str) -> Result<bool, AppError> {
        self.repo.delete_flag(client_id).await
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.repo.purge_expired_flags(self.clock.now()).await
    }
}

/// Periodically remove expired flags until `cancel` fires.
pub fn spawn_flag_sweeper(
    flags: Arc<SessionFlags>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match flags.purge_expired().await {
                        Ok(0) => {}
                        Ok(n) => tracing::debug!("Purged {} expired submission flags", n),
                        Err(e) => tracing::warn!("Failed to purge submission flags: {}", e),
                    }
                }
            }
        }
        tracing::debug!("Submission flag sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::db::init_database;
    use tempfile::TempDir;

    struct Fixture {
        flags: Arc<SessionFlags>,
        clock: Arc<ManualClock>,
        repo: Arc<Repository>,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("flags.sqlite")).await.unwrap();
        let repo = Arc::new(Repository::new(pool));
        let clock = Arc::new(ManualClock::parse("2024-06-10 14:20"));
        let flags = Arc::new(SessionFlags::new(
            repo.clone(),
            clock.clone(),
            Duration::from_secs(5),
        ));
        Fixture {
            flags,
            clock,
            repo,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_banner_visible_until_window_ends() {
        let f = fixture().await;
        f.flags.mark_submitted("browser-a").await.unwrap();
        assert!(f.flags.banner_visible("browser-a").await.unwrap());

        f.clock.advance(chrono::Duration::milliseconds(4_999));
        assert!(f.flags.banner_visible("browser-a").await.unwrap());

        f.clock.advance(chrono::Duration::milliseconds(1));
        assert!(!f.flags.banner_visible("browser-a").await.unwrap());
        // Reading an expired flag removes it.
        assert!(f.repo.get_flag("browser-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flags_are_per_client() {
        let f = fixture().await;
        f.flags.mark_submitted("browser-a").await.unwrap();
        assert!(!f.flags.banner_visible("browser-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_on_navigation() {
        let f = fixture().await;
        f.flags.mark_submitted("browser-a").await.unwrap();
        assert!(f.flags.clear("browser-a").await.unwrap());
        assert!(!f.flags.banner_visible("browser-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweeper_purges_and_stops() {
        let f = fixture().await;
        f.flags.mark_submitted("browser-a").await.unwrap();
        f.clock.advance(chrono::Duration::seconds(6));

        let cancel = CancellationToken::new();
        let handle = spawn_flag_sweeper(f.flags.clone(), Duration::from_millis(10), cancel.clone());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(f.repo.get_flag("browser-a").await.unwrap().is_none());

        cancel.cancel();
        handle.await.unwrap();
    }
}
