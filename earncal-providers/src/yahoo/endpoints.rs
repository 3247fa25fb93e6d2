//! Yahoo Finance endpoint URLs.
//!
//! Every URL the provider touches lives here so tests and config can point
//! the whole flow at another host.

use chrono::NaiveDate;
use earncal_fetch::FetchError;
use serde::{Deserialize, Serialize};
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Cookie issuance endpoint.
pub const COOKIE_URL: &str = "https://fc.yahoo.com";

/// Crumb endpoint.
pub const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";

/// Earnings calendar page (HTML).
pub const CALENDAR_URL: &str = "https://finance.yahoo.com/calendar/earnings";

/// Visualization (data-query) endpoint.
pub const VISUALIZATION_URL: &str = "https://query1.finance.yahoo.com/v1/finance/visualization";

/// Host that relative crumb URLs resolve against.
pub const QUERY_HOST: &str = "https://query1.finance.yahoo.com";

// ============================================================================
// Endpoints
// ============================================================================

/// The set of URLs used by one fetch flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YahooEndpoints {
    /// Cookie issuance endpoint.
    pub cookie_url: String,
    /// Crumb endpoint.
    pub crumb_url: String,
    /// Calendar page, without the `day` parameter.
    pub calendar_url: String,
    /// Visualization endpoint, without query parameters.
    pub visualization_url: String,
    /// Base for relative crumb URLs and jar cookie lookups.
    pub query_host: String,
}

impl Default for YahooEndpoints {
    fn default() -> Self {
        Self {
            cookie_url: COOKIE_URL.to_string(),
            crumb_url: CRUMB_URL.to_string(),
            calendar_url: CALENDAR_URL.to_string(),
            visualization_url: VISUALIZATION_URL.to_string(),
            query_host: QUERY_HOST.to_string(),
        }
    }
}

impl YahooEndpoints {
    /// Points every endpoint at `base` (e.g. a local mock server).
    ///
    /// Paths: `/fc`, `/v1/test/getcrumb`, `/calendar/earnings`,
    /// `/v1/finance/visualization`.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            cookie_url: format!("{base}/fc"),
            crumb_url: format!("{base}/v1/test/getcrumb"),
            calendar_url: format!("{base}/calendar/earnings"),
            visualization_url: format!("{base}/v1/finance/visualization"),
            query_host: base.to_string(),
        }
    }

    /// Calendar page URL for `date`.
    pub fn calendar_page_url(&self, date: NaiveDate) -> Result<Url, FetchError> {
        let mut url = parse(&self.calendar_url)?;
        url.query_pairs_mut()
            .append_pair("day", &date.format("%Y-%m-%d").to_string());
        Ok(url)
    }

    /// Visualization URL carrying `crumb`.
    ///
    /// The crumb is form-urlencoded, so reserved characters survive the
    /// round trip.
    pub fn query_url(&self, crumb: &str) -> Result<Url, FetchError> {
        let mut url = parse(&self.visualization_url)?;
        url.query_pairs_mut()
            .append_pair("lang", "en-US")
            .append_pair("region", "US")
            .append_pair("crumb", crumb);
        Ok(url)
    }

    /// Resolves a possibly relative crumb URL found in the page.
    pub fn resolve(&self, candidate: &str) -> Result<Url, FetchError> {
        let candidate = candidate.trim();
        if candidate.starts_with("http://") || candidate.starts_with("https://") {
            return parse(candidate);
        }

        let base = self.query_host.trim_end_matches('/');
        if candidate.starts_with('/') {
            parse(&format!("{base}{candidate}"))
        } else {
            parse(&format!("{base}/{candidate}"))
        }
    }
}

fn parse(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::Config(format!("invalid endpoint URL {url}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_page_url() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
        let url = YahooEndpoints::default().calendar_page_url(date).unwrap();
        assert_eq!(
            url.as_str(),
            "https://finance.yahoo.com/calendar/earnings?day=2024-04-05"
        );
    }

    #[test]
    fn test_query_url_encodes_crumb() {
        let crumb = "aB/c+d=e&f%g";
        let url = YahooEndpoints::default().query_url(crumb).unwrap();

        assert!(url.as_str().starts_with(
            "https://query1.finance.yahoo.com/v1/finance/visualization?lang=en-US&region=US&crumb="
        ));
        assert!(url.as_str().ends_with("crumb=aB%2Fc%2Bd%3De%26f%25g"));

        let decoded = url
            .query_pairs()
            .find(|(k, _)| k == "crumb")
            .map(|(_, v)| v.into_owned());
        assert_eq!(decoded.as_deref(), Some(crumb));
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let endpoints = YahooEndpoints::default();
        assert_eq!(
            endpoints.resolve("/v1/test/getcrumb").unwrap().as_str(),
            "https://query1.finance.yahoo.com/v1/test/getcrumb"
        );
        assert_eq!(
            endpoints.resolve("v1/test/getcrumb").unwrap().as_str(),
            "https://query1.finance.yahoo.com/v1/test/getcrumb"
        );
        assert_eq!(
            endpoints
                .resolve("https://query2.finance.yahoo.com/v1/test/getcrumb")
                .unwrap()
                .as_str(),
            "https://query2.finance.yahoo.com/v1/test/getcrumb"
        );
    }

    #[test]
    fn test_with_base() {
        let endpoints = YahooEndpoints::with_base("http://127.0.0.1:9000/");
        assert_eq!(endpoints.cookie_url, "http://127.0.0.1:9000/fc");
        assert_eq!(endpoints.query_host, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_override_is_config_error() {
        let endpoints = YahooEndpoints {
            visualization_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = endpoints.query_url("x").unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }
}
