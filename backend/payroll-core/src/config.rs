// src/config.rs
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::PayrollError;
use crate::period_generator::BiweeklySchedule;

pub const ENV_PREFIX: &str = "PAYROLL_";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_ANCHOR_END_DATE: &str = "2025-10-11";
pub const DEFAULT_PERIOD_COUNT: usize = 12;
pub const DEFAULT_EXPORT_DIR: &str = ".";

/// Settings read from `PAYROLL_*` environment variables (and `.env`).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    // Known end date of a pay period; every other period is derived from it.
    #[serde(default = "default_anchor_end_date")]
    pub anchor_end_date: String,
    #[serde(default = "default_period_count")]
    pub period_count: usize,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_anchor_end_date() -> String {
    DEFAULT_ANCHOR_END_DATE.to_string()
}

fn default_period_count() -> usize {
    DEFAULT_PERIOD_COUNT
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_DIR)
}

impl Config {
    pub fn from_env() -> Result<Self, PayrollError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Ok(envy::prefixed(ENV_PREFIX).from_env::<Config>()?)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, PayrollError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter::<_, Config>(vars)?)
    }

    /// Pay schedule for the configured anchor; an unparseable anchor is an
    /// `InvalidArgument` error.
    pub fn schedule(&self) -> Result<BiweeklySchedule, PayrollError> {
        BiweeklySchedule::parse(&self.anchor_end_date)
    }
}
