//! Database repository for submission flags.
//!
//! Timestamps are stored as milliseconds so expiry checks compare integers.

use chrono::{DateTime, NaiveDateTime};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::SubmissionFlag;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the flag for a browser.
    pub async fn upsert_flag(&self, flag: &SubmissionFlag) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO submission_flags (client_id, submitted_at, display_until) VALUES (?, ?, ?)
             ON CONFLICT(client_id) DO UPDATE SET
                submitted_at = excluded.submitted_at,
                display_until = excluded.display_until",
        )
        .bind(&flag.client_id)
        .bind(to_millis(flag.submitted_at))
        .bind(to_millis(flag.display_until))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the flag for a browser, if one is stored.
    pub async fn get_flag(&self, client_id: &str) -> Result<Option<SubmissionFlag>, AppError> {
        let row = sqlx::query(
            "SELECT client_id, submitted_at, display_until FROM submission_flags WHERE client_id = ?",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(flag_from_row).transpose()
    }

    /// Delete the flag for a browser. Returns whether one existed.
    pub async fn delete_flag(&self, client_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM submission_flags WHERE client_id = ?")
            .bind(client_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every flag whose display window ended at or before `now`.
    pub async fn purge_expired_flags(&self, now: NaiveDateTime) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM submission_flags WHERE display_until <= ?")
            .bind(to_millis(now))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn to_millis(at: NaiveDateTime) -> i64 {
    at.and_utc().timestamp_millis()
}

fn from_millis(millis: i64) -> Result<NaiveDateTime, AppError> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp {} in database", millis)))
}

fn flag_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SubmissionFlag, AppError> {
    Ok(SubmissionFlag {
        client_id: row.get("client_id"),
        submitted_at: from_millis(row.get("submitted_at"))?,
        display_until: from_millis(row.get("display_until"))?,
    })
}
