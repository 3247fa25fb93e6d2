//! JSON output formatting.

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use earncal_fetch::{CrumbOutcome, FetchAttempt};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Result of running the crumb chain once.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrumbReport {
    pub date: NaiveDate,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crumb_length: Option<usize>,
    /// Only filled when the user asked for the value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crumb: Option<String>,
    pub attempts: Vec<AttemptOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// One strategy attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutput {
    pub strategy: String,
    pub kind: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl From<&FetchAttempt> for AttemptOutput {
    fn from(attempt: &FetchAttempt) -> Self {
        Self {
            strategy: attempt.strategy_id.clone(),
            kind: attempt.kind.display_name().to_string(),
            success: attempt.success,
            error: attempt.error.clone(),
            duration_ms: millis(attempt.duration),
        }
    }
}

impl CrumbReport {
    /// Builds a report from a chain outcome.
    pub fn from_outcome(date: NaiveDate, outcome: &CrumbOutcome, reveal: bool) -> Self {
        let credential = outcome.result.as_ref().ok().map(|r| &r.credential);

        Self {
            date,
            success: outcome.is_success(),
            strategy: outcome.successful_strategy().map(str::to_string),
            cookie_name: credential
                .and_then(|c| c.cookie())
                .map(|cookie| cookie.name.clone()),
            crumb_length: credential.and_then(|c| c.crumb()).map(str::len),
            crumb: credential
                .and_then(|c| c.crumb())
                .filter(|_| reveal)
                .map(str::to_string),
            attempts: outcome.attempts.iter().map(AttemptOutput::from).collect(),
            error: outcome.result.as_ref().err().map(ToString::to_string),
            duration_ms: millis(outcome.duration),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}
