//! Run configuration from `COVIDPROJECT_*` environment variables.
//!
//! Unset variables take the documented default; unparseable ones are reported
//! on stderr and replaced by the default.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::data::{default_history_start, parse_date, DEFAULT_SOURCE_URL, DEFAULT_STORE_PATH};

pub const DEFAULT_LOG_PATH: &str = "covidproject-log.log";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const SOURCE_URL_VAR: &str = "COVIDPROJECT_SOURCE_URL";
pub const STORE_PATH_VAR: &str = "COVIDPROJECT_STORE_PATH";
pub const LOG_PATH_VAR: &str = "COVIDPROJECT_LOG_PATH";
pub const HISTORY_START_VAR: &str = "COVIDPROJECT_HISTORY_START";
pub const TIMEOUT_VAR: &str = "COVIDPROJECT_TIMEOUT_SECS";
pub const AS_OF_VAR: &str = "COVIDPROJECT_AS_OF";
pub const LOG_FILTER_VAR: &str = "COVIDPROJECT_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub source_url: String,
    pub store_path: PathBuf,
    pub log_path: PathBuf,
    /// Exclusive lower bound of a full load.
    pub history_start: NaiveDate,
    pub timeout: Duration,
    /// Date treated as "today" by the update cycle.
    pub today: NaiveDate,
    pub log_filter: String,
}

impl IngestConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let today = parse_date_var(lookup(AS_OF_VAR), AS_OF_VAR, Local::now().date_naive());
        let history_start = parse_date_var(
            lookup(HISTORY_START_VAR),
            HISTORY_START_VAR,
            default_history_start(),
        );
        let timeout_secs = parse_u64_var(lookup(TIMEOUT_VAR), TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS);

        Self {
            source_url: text(SOURCE_URL_VAR, DEFAULT_SOURCE_URL),
            store_path: PathBuf::from(text(STORE_PATH_VAR, DEFAULT_STORE_PATH)),
            log_path: PathBuf::from(text(LOG_PATH_VAR, DEFAULT_LOG_PATH)),
            history_start,
            timeout: Duration::from_secs(timeout_secs),
            today,
            log_filter: text(LOG_FILTER_VAR, DEFAULT_LOG_FILTER),
        }
    }
}

fn parse_date_var(raw: Option<String>, name: &str, default: NaiveDate) -> NaiveDate {
    let Some(value) = raw.filter(|value| !value.trim().is_empty()) else {
        return default;
    };
    parse_date(&value).unwrap_or_else(|| {
        eprintln!("invalid {name} '{value}', defaulting to {default}");
        default
    })
}

fn parse_u64_var(raw: Option<String>, name: &str, default: u64) -> u64 {
    let Some(value) = raw.filter(|value| !value.trim().is_empty()) else {
        return default;
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => parsed,
        _ => {
            eprintln!("invalid {name} '{value}', defaulting to {default}");
            default
        }
    }
}
