//! Shared primitives for all Rust crates in driftscan.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across driftscan crates.
pub type AppResult<T> = Result<T, AppError>;

/// Exit code reported when the enrichment service fails its startup probe.
///
/// This is how `-1` is rendered by POSIX process exit statuses.
pub const SERVICE_UNAVAILABLE_EXIT_CODE: u8 = 255;

/// Exit code reported for every other fatal error.
pub const FAILURE_EXIT_CODE: u8 = 1;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Error categories raised by a drift analysis run.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required configuration value is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The enrichment service failed its reachability probe.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Object storage or change-set provider call failed.
    #[error("provider error: {0}")]
    Provider(String),

    /// The static-analysis subprocess failed or produced unusable output.
    #[error("scanner error: {0}")]
    Scanner(String),

    /// An enrichment request failed or returned a malformed body.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// Posting the pull request comment failed.
    #[error("publish error: {0}")]
    Publish(String),

    /// The run was cancelled before it finished.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the process exit code this error terminates the run with.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ServiceUnavailable(_) => SERVICE_UNAVAILABLE_EXIT_CODE,
            _ => FAILURE_EXIT_CODE,
        }
    }
}
