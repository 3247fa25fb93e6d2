//! Fetch context providing access to the HTTP session.
//!
//! One context is built per fetch operation and passed by reference to every
//! strategy and request. Dropping it drops the session and its cookie jar.

use std::time::Duration;

use crate::error::FetchError;
use crate::host::http::{Session, BROWSER_USER_AGENT, DEFAULT_TIMEOUT_SECS};

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Timeout for each HTTP request.
    pub timeout: Duration,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl FetchSettings {
    /// Creates settings with custom timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates settings with a custom User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to crumb strategies and the authenticated fetcher.
#[derive(Debug)]
pub struct FetchContext {
    /// Cookie-jar HTTP session owned by this operation.
    pub session: Session,
    /// Fetch settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a new fetch context with default settings.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a context with custom settings.
    pub fn with_settings(settings: FetchSettings) -> Result<Self, FetchError> {
        let session = Session::with_options(settings.timeout, &settings.user_agent)
            .map_err(|e| FetchError::from_http("session", e))?;
        Ok(Self { session, settings })
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the effective timeout for requests.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Debug, Default)]
pub struct FetchContextBuilder {
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fetch settings.
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Sets the User-Agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.settings.user_agent = user_agent.into();
        self
    }

    /// Builds the fetch context with a fresh session.
    pub fn build(self) -> Result<FetchContext, FetchError> {
        FetchContext::with_settings(self.settings)
    }
}

// ============================================================================
// Tests
// ============================================================================
