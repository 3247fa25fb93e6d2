//! HTTP session with a persistent cookie jar and tracing.
//!
//! A [`Session`] is one browser-like HTTP context: every request carries the
//! same User-Agent and every `Set-Cookie` lands in the same jar. Sessions are
//! created per fetch operation and never shared between operations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use earncal_core::SessionCookie;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{header, header::HeaderMap, Client, Response};
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Desktop browser User-Agent sent with every request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

// ============================================================================
// Session
// ============================================================================

/// HTTP client wrapper holding one cookie jar.
#[derive(Clone)]
pub struct Session {
    inner: Client,
    jar: Arc<Jar>,
    timeout: Duration,
}

impl Session {
    /// Creates a session with the default timeout and User-Agent.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_options(Duration::from_secs(DEFAULT_TIMEOUT_SECS), BROWSER_USER_AGENT)
    }

    /// Creates a session with a custom timeout and User-Agent.
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, HttpError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self {
            inner: client,
            jar,
            timeout,
        })
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, error: reqwest::Error) -> HttpError {
        if error.is_timeout() {
            HttpError::Timeout(self.timeout.as_secs())
        } else {
            HttpError::Request(error)
        }
    }

    /// Performs a GET request. Cookies from the jar are attached.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let url = parse_url(url)?;
        debug!("GET request");

        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request with one explicit cookie.
    ///
    /// The explicit `Cookie` header replaces whatever the jar would send.
    #[instrument(skip(self, cookie), fields(url = %url, cookie = %cookie.name))]
    pub async fn get_with_cookie(
        &self,
        url: &str,
        cookie: &SessionCookie,
    ) -> Result<Response, HttpError> {
        let url = parse_url(url)?;
        debug!("GET request with cookie");

        let response = self
            .inner
            .get(url)
            .header(header::COOKIE, cookie.header_value())
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with a JSON body and custom headers.
    #[instrument(skip(self, body, headers), fields(url = %redact_query(url)))]
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        headers: HeaderMap,
    ) -> Result<Response, HttpError> {
        let url = parse_url(url)?;
        debug!("POST request with JSON");

        let response = self
            .inner
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Reads a response body as text.
    pub async fn text(&self, response: Response) -> Result<String, HttpError> {
        response.text().await.map_err(|e| self.classify(e))
    }

    /// Returns the first cookie the jar would send to `url`.
    pub fn cookie_for(&self, url: &str) -> Option<SessionCookie> {
        let url = Url::parse(url).ok()?;
        let header = self.jar.cookies(&url)?;
        SessionCookie::from_header(header.to_str().ok()?)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns the first cookie set by `response`.
pub fn first_response_cookie(response: &Response) -> Option<SessionCookie> {
    response
        .cookies()
        .next()
        .map(|c| SessionCookie::new(c.name(), c.value()))
}

fn parse_url(url: &str) -> Result<Url, HttpError> {
    Url::parse(url).map_err(|e| HttpError::InvalidUrl(format!("{url}: {e}")))
}

/// Strips the query string so tokens in it never reach the logs.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

// ============================================================================
// Tests
// ============================================================================
