//! Process configuration, read from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `TELEGRAM_BOT_TOKEN` | required |
//! | `GEMINI_API_KEY` | required |
//! | `GEMINI_MODEL` | `gemini-2.5-flash` |
//! | `GEMINI_BASE_URL` | Google endpoint |
//! | `TELEGRAM_API_URL` | `https://api.telegram.org` |
//! | `DATABASE_URL` | unset: in-memory stores |
//! | `SCAN_SCHEDULE` | `0 0 * * * *` |
//! | `SCAN_ON_STARTUP` | `false` |
//! | `SCAN_VARIANT` | `standard` |
//! | `UPSTREAM_TIMEOUT_SECS` | `60` |

use std::time::Duration;

use tinkerscout_ai::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use tinkerscout_ai::{GeminiConfig, ScanVariant};

use crate::notify::telegram::DEFAULT_API_URL;
use crate::notify::TelegramConfig;
use crate::scan::{ScanScheduler, HOURLY};

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_api_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub database_url: Option<String>,
    pub scan_schedule: String,
    pub scan_on_startup: bool,
    pub scan_variant: ScanVariant,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let scan_schedule = get("SCAN_SCHEDULE").unwrap_or_else(|| HOURLY.to_string());
        ScanScheduler::from_expression(&scan_schedule).map_err(|e| ConfigError::Invalid {
            key: "SCAN_SCHEDULE",
            reason: e.reason,
        })?;

        let scan_on_startup = match get("SCAN_ON_STARTUP") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::Invalid {
                key: "SCAN_ON_STARTUP",
                reason: format!("expected true/false, got '{v}'"),
            })?,
        };

        let scan_variant = match get("SCAN_VARIANT") {
            None => ScanVariant::default(),
            Some(v) => v.parse().map_err(|e: tinkerscout_ai::UnknownVariant| {
                ConfigError::Invalid {
                    key: "SCAN_VARIANT",
                    reason: e.to_string(),
                }
            })?,
        };

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            None => Duration::from_secs(60),
            Some(v) => match v.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "UPSTREAM_TIMEOUT_SECS",
                        reason: format!("expected a positive number of seconds, got '{v}'"),
                    });
                }
            },
        };

        Ok(Self {
            telegram_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_api_url: get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            database_url: get("DATABASE_URL"),
            scan_schedule,
            scan_on_startup,
            scan_variant,
            upstream_timeout,
        })
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig::new(self.gemini_api_key.clone())
            .with_model(self.gemini_model.clone())
            .with_base_url(self.gemini_base_url.clone())
            .with_timeout(self.upstream_timeout)
    }

    pub fn telegram(&self) -> TelegramConfig {
        TelegramConfig::new(self.telegram_token.clone()).with_api_url(self.telegram_api_url.clone())
    }

    pub fn scheduler(&self) -> Result<ScanScheduler, ConfigError> {
        ScanScheduler::from_expression(&self.scan_schedule)
            .map(|s| s.with_run_on_startup(self.scan_on_startup))
            .map_err(|e| ConfigError::Invalid {
                key: "SCAN_SCHEDULE",
                reason: e.reason,
            })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
