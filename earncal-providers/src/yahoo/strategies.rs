//! Yahoo crumb strategies.
//!
//! 1. **Cookie endpoint** - `fc.yahoo.com` for the cookie, `getcrumb` for the crumb
//! 2. **Inline script** - `CrumbStore` literal in the calendar page
//! 3. **Script attribute** - crumb URL from a `<script data-url>` element
//! 4. **Embedded JSON** - `body` field of a JSON script in the calendar page
//!
//! Strategies 2-4 share one [`CalendarPage`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use earncal_core::{Credential, SessionCookie};
use earncal_fetch::{
    first_response_cookie, CrumbPipeline, CrumbSource, CrumbStrategy, FetchContext, FetchError,
};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument};

use super::endpoints::YahooEndpoints;
use super::error::YahooError;
use super::page::{embedded_json_texts, find_crumb_script, find_inline_crumb, CalendarPage};

/// Crumbs longer than this are page fragments, not tokens.
const MAX_CRUMB_LEN: usize = 100;

// ============================================================================
// Crumb Validation
// ============================================================================

/// Checks a crumb candidate and returns it trimmed and unquoted.
pub fn validate_crumb(candidate: &str) -> Result<String, YahooError> {
    let crumb = candidate.trim().trim_matches('"').trim();

    if crumb.is_empty() {
        return Err(YahooError::CrumbRejected("empty".to_string()));
    }
    let lower = crumb.to_ascii_lowercase();
    if lower.contains("too many requests") {
        return Err(YahooError::RateLimited("crumb endpoint"));
    }
    if lower.contains("<html") || lower.contains("<!doctype") {
        return Err(YahooError::CrumbRejected("HTML document".to_string()));
    }
    if crumb.starts_with('{') || crumb.starts_with('[') {
        return Err(YahooError::CrumbRejected("JSON document".to_string()));
    }
    if crumb.len() >= MAX_CRUMB_LEN || crumb.chars().any(char::is_whitespace) {
        return Err(YahooError::CrumbRejected(format!(
            "not a token ({} chars)",
            crumb.len()
        )));
    }

    Ok(crumb.to_string())
}

fn complete(cookie: SessionCookie, crumb: &str) -> Result<Credential, FetchError> {
    Credential::empty()
        .with_cookie(cookie)
        .with_crumb(crumb)
        .map_err(|e| FetchError::from(YahooError::CrumbRejected(e.to_string())))
}

/// GETs `url` with `cookie` and validates the body as a crumb.
async fn fetch_crumb(
    ctx: &FetchContext,
    url: &str,
    cookie: &SessionCookie,
    endpoint: &'static str,
) -> Result<String, YahooError> {
    let response = ctx.session.get_with_cookie(url, cookie).await?;
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(YahooError::RateLimited(endpoint));
    }
    if !status.is_success() {
        return Err(YahooError::HttpStatus {
            endpoint,
            status: status.as_u16(),
        });
    }

    let body = ctx.session.text(response).await?;
    let crumb = validate_crumb(&body)?;
    debug!(endpoint, crumb_len = crumb.len(), "Crumb obtained");
    Ok(crumb)
}

// ============================================================================
// Cookie Endpoint Strategy (Highest Priority)
// ============================================================================

/// Cookie from the issuance endpoint, crumb from the crumb endpoint.
pub struct CookieCrumbStrategy {
    endpoints: YahooEndpoints,
}

impl CookieCrumbStrategy {
    /// Creates a new cookie endpoint strategy.
    pub fn new(endpoints: YahooEndpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl CrumbStrategy for CookieCrumbStrategy {
    fn id(&self) -> &str {
        "yahoo.cookie_crumb"
    }

    fn kind(&self) -> CrumbSource {
        CrumbSource::CookieEndpoint
    }

    #[instrument(skip(self, ctx))]
    async fn acquire(&self, ctx: &FetchContext) -> Result<Credential, FetchError> {
        debug!("Requesting session cookie");

        // The issuance endpoint typically answers 404 while still setting
        // the cookie, so the status is not checked.
        let response = ctx
            .session
            .get(&self.endpoints.cookie_url)
            .await
            .map_err(YahooError::from)?;
        let cookie = first_response_cookie(&response)
            .or_else(|| ctx.session.cookie_for(&self.endpoints.query_host))
            .ok_or_else(|| YahooError::CookieMissing("cookie endpoint".to_string()))?;
        debug!(cookie = %cookie.name, "Session cookie obtained");

        let crumb = fetch_crumb(ctx, &self.endpoints.crumb_url, &cookie, "crumb endpoint").await?;
        complete(cookie, &crumb)
    }
}

// ============================================================================
// Inline Script Strategy
// ============================================================================

/// `CrumbStore` literal in the calendar page markup.
pub struct InlineScriptStrategy {
    page: Arc<CalendarPage>,
}

impl InlineScriptStrategy {
    /// Creates a new inline script strategy.
    pub fn new(page: Arc<CalendarPage>) -> Self {
        Self { page }
    }
}

#[async_trait]
impl CrumbStrategy for InlineScriptStrategy {
    fn id(&self) -> &str {
        "yahoo.inline_script"
    }

    fn kind(&self) -> CrumbSource {
        CrumbSource::InlineScript
    }

    #[instrument(skip(self, ctx))]
    async fn acquire(&self, ctx: &FetchContext) -> Result<Credential, FetchError> {
        let snapshot = self.page.load(ctx).await?;
        let raw = find_inline_crumb(&snapshot.html).ok_or(YahooError::NotFound("CrumbStore"))?;
        let crumb = validate_crumb(&raw)?;
        let cookie = self.page.cookie(snapshot, ctx)?;
        complete(cookie, &crumb)
    }
}

// ============================================================================
// Script Attribute Strategy
// ============================================================================

/// Crumb URL advertised by a `<script data-url>` element.
pub struct ScriptAttributeStrategy {
    page: Arc<CalendarPage>,
    endpoints: YahooEndpoints,
}

impl ScriptAttributeStrategy {
    /// Creates a new script attribute strategy.
    pub fn new(page: Arc<CalendarPage>, endpoints: YahooEndpoints) -> Self {
        Self { page, endpoints }
    }
}

#[async_trait]
impl CrumbStrategy for ScriptAttributeStrategy {
    fn id(&self) -> &str {
        "yahoo.script_attribute"
    }

    fn kind(&self) -> CrumbSource {
        CrumbSource::ScriptAttribute
    }

    #[instrument(skip(self, ctx))]
    async fn acquire(&self, ctx: &FetchContext) -> Result<Credential, FetchError> {
        let snapshot = self.page.load(ctx).await?;
        let script = find_crumb_script(&snapshot.html)
            .ok_or(YahooError::NotFound("script[data-url*=getcrumb]"))?;
        let cookie = self.page.cookie(snapshot, ctx)?;

        let url = self.endpoints.resolve(&script.data_url)?;
        debug!(url = %url.path(), "Following script crumb URL");

        let crumb = fetch_crumb(ctx, url.as_str(), &cookie, "script crumb URL").await?;
        complete(cookie, &crumb)
    }
}

// ============================================================================
// Embedded JSON Strategy (Lowest Priority)
// ============================================================================

/// `body` field of a JSON payload embedded in a script element.
pub struct EmbeddedJsonStrategy {
    page: Arc<CalendarPage>,
}

impl EmbeddedJsonStrategy {
    /// Creates a new embedded JSON strategy.
    pub fn new(page: Arc<CalendarPage>) -> Self {
        Self { page }
    }
}

#[async_trait]
impl CrumbStrategy for EmbeddedJsonStrategy {
    fn id(&self) -> &str {
        "yahoo.embedded_json"
    }

    fn kind(&self) -> CrumbSource {
        CrumbSource::EmbeddedJson
    }

    #[instrument(skip(self, ctx))]
    async fn acquire(&self, ctx: &FetchContext) -> Result<Credential, FetchError> {
        let snapshot = self.page.load(ctx).await?;
        let crumb = embedded_json_texts(&snapshot.html)
            .iter()
            .filter_map(|text| serde_json::from_str::<Value>(text.trim()).ok())
            .filter_map(|value| value.get("body").and_then(Value::as_str).map(str::to_string))
            .find_map(|body| validate_crumb(&body).ok())
            .ok_or(YahooError::NotFound("JSON script with a crumb body"))?;
        let cookie = self.page.cookie(snapshot, ctx)?;
        complete(cookie, &crumb)
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Builds the four-strategy chain for `date`, with one shared calendar page.
pub fn build_crumb_pipeline(date: NaiveDate, endpoints: &YahooEndpoints) -> CrumbPipeline {
    let page = Arc::new(CalendarPage::new(date, endpoints.clone()));

    CrumbPipeline::with_strategies(vec![
        Box::new(CookieCrumbStrategy::new(endpoints.clone())),
        Box::new(InlineScriptStrategy::new(Arc::clone(&page))),
        Box::new(ScriptAttributeStrategy::new(Arc::clone(&page), endpoints.clone())),
        Box::new(EmbeddedJsonStrategy::new(page)),
    ])
}

// ============================================================================
// Tests
// ============================================================================
