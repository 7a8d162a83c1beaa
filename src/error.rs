//! Error types for the VetCare client core.

use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime};

/// Top-level error type for the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Operation cancelled")]
    Cancelled,
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Credential storage errors.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Credential storage failed: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reported by the clinic API collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected by server: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Client-side field and shape violations. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Incomplete fields: {}", missing.join(", "))]
    IncompleteFields { missing: Vec<&'static str> },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Passwords do not match")]
    PasswordMismatch,
}

impl ValidationError {
    /// The field this error names, if it names exactly one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => Some(field),
            Self::IncompleteFields { .. } | Self::PasswordMismatch => None,
        }
    }
}

/// A write operation that failed after client-side validation passed.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Could not persist credential: {0}")]
    Credential(#[from] CredentialError),
}

/// Appointment scheduling errors.
#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("Select a date and a time before confirming")]
    SelectionIncomplete,

    #[error("Selected time {selected} is outside working hours {start}-{end}")]
    OutsideWorkingHours {
        selected: NaiveTime,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Malformed working hours {value:?}: {reason}")]
    InvalidWorkingHours { value: String, reason: String },

    #[error("Selected time {local} does not exist in the clinic time zone")]
    NonexistentLocalTime { local: NaiveDateTime },

    #[error("Veterinarian {veterinarian_id} has no published working hours")]
    NoWorkingHours { veterinarian_id: String },

    #[error("Picker cannot accept {event} while {phase}")]
    UnexpectedPickerEvent {
        phase: &'static str,
        event: &'static str,
    },

    #[error("Authentication required")]
    Unauthorized,

    #[error("Credential store error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Appointment submission failed: {0}")]
    SubmissionFailed(#[source] ApiError),

    #[error("Appointment request cancelled")]
    Cancelled,
}

/// Onboarding flow errors.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Cannot {action} while {state}")]
    InvalidTransition { state: String, action: &'static str },

    #[error("Submission failed: {0}")]
    SubmissionFailed(#[from] SubmissionError),

    #[error("Onboarding step cancelled")]
    Cancelled,
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
