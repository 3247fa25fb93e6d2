//! Lazily fetched calendar page shared by the page-based crumb strategies.
//!
//! The inline-script, script-attribute and embedded-JSON strategies all read
//! the same earnings calendar page. [`CalendarPage`] fetches it on first use
//! and caches the outcome, failure included, for the rest of the chain.
//!
//! The markup helpers are synchronous so no parsed document is ever held
//! across an await point.

use std::sync::LazyLock;

use chrono::NaiveDate;
use earncal_core::SessionCookie;
use earncal_fetch::{first_response_cookie, FetchContext};
use regex::Regex;
use scraper::{Html, Selector};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::endpoints::YahooEndpoints;
use super::error::YahooError;

// ============================================================================
// Patterns
// ============================================================================

/// `"CrumbStore":{"crumb":"..."}` inside inline scripts.
static CRUMB_STORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""CrumbStore":\{"crumb":"(?P<crumb>[^"]+)"\}"#).expect("Invalid regex")
});

/// Script elements that advertise a crumb URL.
const CRUMB_SCRIPT_SELECTOR: &str = r#"script[data-url*="getcrumb"]"#;

/// Script elements carrying JSON.
const JSON_SCRIPT_SELECTOR: &str = r#"script[type="application/json"]"#;

// ============================================================================
// Page Snapshot
// ============================================================================

/// The fetched calendar page.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    /// Raw markup.
    pub html: String,
    /// First cookie set by the page response, if any.
    pub cookie: Option<SessionCookie>,
}

// ============================================================================
// Calendar Page
// ============================================================================

/// Calendar page for one date, fetched at most once.
#[derive(Debug)]
pub struct CalendarPage {
    date: NaiveDate,
    endpoints: YahooEndpoints,
    cell: OnceCell<Result<PageSnapshot, YahooError>>,
}

impl CalendarPage {
    /// Creates an unfetched page.
    pub fn new(date: NaiveDate, endpoints: YahooEndpoints) -> Self {
        Self {
            date,
            endpoints,
            cell: OnceCell::new(),
        }
    }

    /// Returns the page, fetching it on first call.
    pub async fn load(&self, ctx: &FetchContext) -> Result<&PageSnapshot, YahooError> {
        self.cell
            .get_or_init(|| self.fetch(ctx))
            .await
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Returns the cookie page strategies should use: the page's own cookie, else the
    /// first cookie the jar holds for the query host.
    pub fn cookie(
        &self,
        snapshot: &PageSnapshot,
        ctx: &FetchContext,
    ) -> Result<SessionCookie, YahooError> {
        snapshot
            .cookie
            .clone()
            .or_else(|| ctx.session.cookie_for(&self.endpoints.query_host))
            .ok_or_else(|| YahooError::CookieMissing("calendar page".to_string()))
    }

    #[instrument(skip(self, ctx), fields(date = %self.date))]
    async fn fetch(&self, ctx: &FetchContext) -> Result<PageSnapshot, YahooError> {
        let url = self
            .endpoints
            .calendar_page_url(self.date)
            .map_err(|e| YahooError::InvalidUrl(e.to_string()))?;

        debug!("Fetching calendar page");
        let response = ctx.session.get(url.as_str()).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(YahooError::HttpStatus {
                endpoint: "calendar page",
                status: status.as_u16(),
            });
        }

        let cookie = first_response_cookie(&response);
        let html = ctx.session.text(response).await?;
        debug!(bytes = html.len(), has_cookie = cookie.is_some(), "Calendar page loaded");

        Ok(PageSnapshot { html, cookie })
    }
}

// ============================================================================
// Markup Helpers
// ============================================================================

/// A `<script data-url="...getcrumb...">` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrumbScript {
    /// The `data-url` attribute.
    pub data_url: String,
    /// The element's text.
    pub text: String,
}

/// Finds a `CrumbStore` crumb in the raw markup. First match wins.
pub fn find_inline_crumb(html: &str) -> Option<String> {
    let raw = CRUMB_STORE_RE.captures(html)?.name("crumb")?.as_str();
    // the capture is a JSON string literal; decode escapes such as \u002F
    Some(serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string()))
}

/// Finds the first script element advertising a crumb URL.
pub fn find_crumb_script(html: &str) -> Option<CrumbScript> {
    let selector = Selector::parse(CRUMB_SCRIPT_SELECTOR).ok()?;
    let document = Html::parse_document(html);
    document.select(&selector).find_map(|element| {
        let data_url = element.value().attr("data-url")?.trim();
        if data_url.is_empty() {
            return None;
        }
        Some(CrumbScript {
            data_url: data_url.to_string(),
            text: element.text().collect(),
        })
    })
}

/// Texts of scripts that may embed a JSON payload: crumb scripts first, then
/// `application/json` scripts, in document order.
pub fn embedded_json_texts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut texts: Vec<String> = Vec::new();

    for selector in [CRUMB_SCRIPT_SELECTOR, JSON_SCRIPT_SELECTOR] {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            let text: String = element.text().collect();
            if !text.trim().is_empty() && !texts.contains(&text) {
                texts.push(text);
            }
        }
    }

    texts
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_crumb() {
        let html = r#"<script>root.App.main = {"context":{"dispatcher":{"stores":{"CrumbStore":{"crumb":"abc123"}}}}};</script>"#;
        assert_eq!(find_inline_crumb(html).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_inline_crumb_decodes_escapes() {
        let html = r#"{"CrumbStore":{"crumb":"ab\u002Fcd"}}"#;
        assert_eq!(find_inline_crumb(html).as_deref(), Some("ab/cd"));
    }

    #[test]
    fn test_inline_crumb_first_match_wins() {
        let html = r#"{"CrumbStore":{"crumb":"first"}} {"CrumbStore":{"crumb":"second"}}"#;
        assert_eq!(find_inline_crumb(html).as_deref(), Some("first"));
    }

    #[test]
    fn test_inline_crumb_missing() {
        assert!(find_inline_crumb("<html><body>nothing here</body></html>").is_none());
    }

    #[test]
    fn test_crumb_script() {
        let html = r#"<html><head>
            <script src="/app.js"></script>
            <script type="application/json" data-url="/v1/test/getcrumb?lang=en">{"body":"xyz"}</script>
        </head></html>"#;

        let script = find_crumb_script(html).unwrap();
        assert_eq!(script.data_url, "/v1/test/getcrumb?lang=en");
        assert_eq!(script.text, r#"{"body":"xyz"}"#);
    }

    #[test]
    fn test_crumb_script_missing() {
        let html = r#"<script data-url="/v1/finance/quote">{}</script>"#;
        assert!(find_crumb_script(html).is_none());
    }

    #[test]
    fn test_embedded_json_texts_order() {
        let html = r#"<html><body>
            <script type="application/json">{"body":"later"}</script>
            <script data-url="https://query1.finance.yahoo.com/v1/test/getcrumb">{"body":"first"}</script>
            <script type="application/json">   </script>
        </body></html>"#;

        let texts = embedded_json_texts(html);
        assert_eq!(texts, [r#"{"body":"first"}"#, r#"{"body":"later"}"#]);
    }
}
