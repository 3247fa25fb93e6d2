//! Fetch error types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::FetchAttempt;

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification of a [`FetchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No usable credential, or the provider rejected it.
    Authentication,
    /// Transport failure or timeout.
    Network,
    /// The provider answered with something that cannot be parsed.
    MalformedResponse,
    /// Local setup problem (client construction, bad endpoint URL).
    Config,
}

impl ErrorKind {
    /// Returns the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Network => "network",
            Self::MalformedResponse => "malformed response",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
///
/// Every variant except [`FetchError::Config`] names the stage it was
/// raised in (e.g. `crumb`, `query`, `normalize`).
#[derive(Debug, Error)]
pub enum FetchError {
    /// No credential could be obtained, or the provider rejected it.
    #[error("Authentication failed during {stage}: {message}")]
    Authentication {
        /// Stage that raised the error.
        stage: &'static str,
        /// Human-readable reason.
        message: String,
        /// Every strategy attempt made before giving up (may be empty).
        attempts: Vec<FetchAttempt>,
    },

    /// HTTP transport failed.
    #[error("Network error during {stage}: {message}")]
    Network {
        /// Stage that raised the error.
        stage: &'static str,
        /// Underlying transport error.
        message: String,
    },

    /// Request timed out.
    #[error("Request timed out during {stage} after {secs} seconds")]
    Timeout {
        /// Stage that raised the error.
        stage: &'static str,
        /// Configured timeout.
        secs: u64,
    },

    /// Response could not be interpreted.
    #[error("Malformed response during {stage}: {message}")]
    MalformedResponse {
        /// Stage that raised the error.
        stage: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// Local configuration problem.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Creates an authentication error without strategy attempts.
    pub fn authentication(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Authentication {
            stage,
            message: message.into(),
            attempts: Vec::new(),
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(stage: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            stage,
            message: message.into(),
        }
    }

    /// Converts a session error raised in `stage`.
    pub fn from_http(stage: &'static str, error: HttpError) -> Self {
        match error {
            HttpError::Timeout(secs) => Self::Timeout { stage, secs },
            HttpError::Request(e) => Self::Network {
                stage,
                message: e.to_string(),
            },
            HttpError::InvalidUrl(url) => Self::Config(format!("invalid URL: {url}")),
            HttpError::Client(message) => Self::Config(message),
        }
    }

    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Network { .. } | Self::Timeout { .. } => ErrorKind::Network,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns the stage that raised the error, if any.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Authentication { stage, .. }
            | Self::Network { stage, .. }
            | Self::Timeout { stage, .. }
            | Self::MalformedResponse { stage, .. } => Some(*stage),
            Self::Config(_) => None,
        }
    }

    /// Returns the recorded strategy attempts of an authentication error.
    pub fn attempts(&self) -> &[FetchAttempt] {
        match self {
            Self::Authentication { attempts, .. } => attempts,
            _ => &[],
        }
    }

    /// Returns true if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type raised by [`crate::Session`].
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The underlying client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

// ============================================================================
// Tests
// ============================================================================
