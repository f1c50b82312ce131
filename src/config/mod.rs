//! Configuration module for the booking forms backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use thiserror::Error;

use crate::availability::{DateInputStyle, FormVariant};
use crate::workflow::IdAssignment;

/// A configuration value that could not be parsed.
#[derive(Debug, Error)]
#[error("invalid value for {var}: {value:?} ({reason})")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Path to the SQLite file holding submission flags
    pub db_path: PathBuf,
    /// Base URL of the booking REST API
    pub api_base_url: String,
    /// Request timeout for booking API calls
    pub api_timeout: Duration,
    /// Optional override for the bundled service catalog
    pub catalog_path: Option<PathBuf>,
    /// Who issues booking identifiers
    pub id_assignment: IdAssignment,
    /// Date input, slot and phone settings of the form
    pub variant: FormVariant,
    /// How long the "submitted" banner stays visible
    pub banner_duration: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bind_addr = parse_var("BOOKING_BIND_ADDR", "127.0.0.1:8080", |v| {
            v.parse::<SocketAddr>().map_err(|e| e.to_string())
        })?;

        let log_level = env::var("BOOKING_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let db_path = env::var("BOOKING_DB_PATH")
            .unwrap_or_else(|_| "./data/sessions.sqlite".to_string())
            .into();

        let api_base_url = env::var("BOOKING_API_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string())
            .trim_end_matches('/')
            .to_string();

        let api_timeout = parse_var("BOOKING_API_TIMEOUT_SECS", "10", parse_secs)?;

        let catalog_path = env::var("BOOKING_CATALOG_PATH").ok().map(PathBuf::from);

        let id_assignment = parse_var("BOOKING_ID_ASSIGNMENT", "collaborator", |v| {
            v.parse::<IdAssignment>()
        })?;

        let date_input = parse_var("BOOKING_DATE_INPUT", "picker", |v| {
            v.parse::<DateInputStyle>()
        })?;
        let mut variant = match date_input {
            DateInputStyle::ConstrainedPicker => FormVariant::booking_page(),
            DateInputStyle::NativeRange => FormVariant::native_range(),
        };
        variant.slot_granularity_minutes = parse_var("BOOKING_SLOT_MINUTES", "60", |v| {
            match v.parse::<u32>() {
                Ok(0) => Err("must be greater than zero".to_string()),
                Ok(n) => Ok(n),
                Err(e) => Err(e.to_string()),
            }
        })?;
        if let Ok(raw) = env::var("BOOKING_FIRST_SLOT") {
            variant.first_slot = parse_slot("BOOKING_FIRST_SLOT", &raw)?;
        }
        if let Ok(raw) = env::var("BOOKING_LAST_SLOT") {
            variant.last_slot = parse_slot("BOOKING_LAST_SLOT", &raw)?;
        }
        variant.max_phone_digits = parse_var("BOOKING_MAX_PHONE_DIGITS", "9", |v| {
            v.parse::<usize>().map_err(|e| e.to_string())
        })?;

        let banner_duration = parse_var("BOOKING_BANNER_SECS", "5", parse_secs)?;

        Ok(Self {
            bind_addr,
            log_level,
            db_path,
            api_base_url,
            api_timeout,
            catalog_path,
            id_assignment,
            variant,
            banner_duration,
        })
    }
}

fn parse_var<T>(
    var: &'static str,
    default: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    let value = env::var(var).unwrap_or_else(|_| default.to_string());
    let parsed = parse(value.trim());
    parsed.map_err(|reason| ConfigError {
        var,
        value,
        reason,
    })
}

fn parse_secs(value: &str) -> Result<Duration, String> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| e.to_string())
}

fn parse_slot(var: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|e| ConfigError {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
