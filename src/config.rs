//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use chrono_tz::Tz;

use crate::error::ConfigError;
use crate::scheduling::ClinicTimeZone;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the clinic API, without a trailing slash.
    pub api_url: String,
    /// Upper bound on any single in-flight request.
    pub request_timeout: Duration,
    /// Where the file-backed credential store keeps the session.
    pub credential_path: PathBuf,
    /// Zone picked wall-clock times are converted from. Defaults to the host zone.
    pub time_zone: ClinicTimeZone,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
            credential_path: PathBuf::from("./data/credential.json"),
            time_zone: ClinicTimeZone::Local,
        }
    }
}

impl ClientConfig {
    /// Build a config from `VETCARE_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("VETCARE_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if url.is_empty() {
                return Err(invalid("VETCARE_API_URL", "must not be empty"));
            }
            config.api_url = url.to_string();
        }

        if let Some(secs) = lookup("VETCARE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| invalid("VETCARE_REQUEST_TIMEOUT_SECS", e))?;
            if secs == 0 {
                return Err(invalid("VETCARE_REQUEST_TIMEOUT_SECS", "must be positive"));
            }
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(path) = lookup("VETCARE_CREDENTIAL_PATH") {
            config.credential_path = PathBuf::from(path);
        }

        if let Some(name) = lookup("VETCARE_TIME_ZONE") {
            let tz: Tz = name
                .trim()
                .parse()
                .map_err(|_| invalid("VETCARE_TIME_ZONE", format!("unknown time zone {name:?}")))?;
            config.time_zone = ClinicTimeZone::Named(tz);
        }

        // A fixed offset ignores DST and wins over a named zone.
        if let Some(minutes) = lookup("VETCARE_UTC_OFFSET_MINUTES") {
            let minutes: i32 = minutes
                .trim()
                .parse()
                .map_err(|e| invalid("VETCARE_UTC_OFFSET_MINUTES", e))?;
            let offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| invalid("VETCARE_UTC_OFFSET_MINUTES", "out of range"))?;
            config.time_zone = ClinicTimeZone::Fixed(offset);
        }

        Ok(config)
    }
}

fn invalid(key: &str, message: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
