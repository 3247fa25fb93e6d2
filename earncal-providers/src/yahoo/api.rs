//! Authenticated visualization API client.
//!
//! # API Endpoint
//!
//! ```text
//! POST https://query1.finance.yahoo.com/v1/finance/visualization?lang=en-US&region=US&crumb=<crumb>
//! x-crumb: <crumb>
//! Cookie: <name>=<value>
//! Content-Type: application/json
//! ```
//!
//! The crumb travels three ways at once; the endpoint rejects the request
//! when any of them disagree with the session.

use earncal_core::Credential;
use earncal_fetch::{FetchContext, FetchError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::endpoints::YahooEndpoints;
use super::query::QueryRequest;

/// Stage name for errors raised here.
pub const QUERY_STAGE: &str = "query";

// ============================================================================
// API Client
// ============================================================================

/// Client for the visualization endpoint.
#[derive(Debug, Clone, Default)]
pub struct VisualizationClient {
    endpoints: YahooEndpoints,
}

impl VisualizationClient {
    /// Creates a client for the given endpoints.
    pub fn new(endpoints: YahooEndpoints) -> Self {
        Self { endpoints }
    }

    /// Runs one query and returns the parsed JSON body.
    ///
    /// The credential must be complete; otherwise no request is sent.
    #[instrument(skip_all, fields(size = request.size))]
    pub async fn query(
        &self,
        ctx: &FetchContext,
        credential: &Credential,
        request: &QueryRequest,
    ) -> Result<Value, FetchError> {
        let (Some(cookie), Some(crumb), true) = (
            credential.cookie(),
            credential.crumb(),
            credential.is_complete(),
        ) else {
            return Err(FetchError::authentication(
                QUERY_STAGE,
                format!("credential is not complete (state: {})", credential.state()),
            ));
        };

        let url = self.endpoints.query_url(crumb)?;
        let headers = auth_headers(crumb, &cookie.header_value())?;

        debug!(crumb_len = crumb.len(), cookie = %cookie.name, "Posting visualization query");
        let response = ctx
            .session
            .post_json(url.as_str(), request, headers)
            .await
            .map_err(|e| FetchError::from_http(QUERY_STAGE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::authentication(
                QUERY_STAGE,
                format!("visualization endpoint answered HTTP {status}"),
            ));
        }

        let text = ctx
            .session
            .text(response)
            .await
            .map_err(|e| FetchError::from_http(QUERY_STAGE, e))?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| FetchError::malformed(QUERY_STAGE, format!("body is not JSON: {e}")))?;

        info!(bytes = text.len(), "Visualization query succeeded");
        Ok(body)
    }
}

fn auth_headers(crumb: &str, cookie: &str) -> Result<HeaderMap, FetchError> {
    let invalid = |what: &str| {
        FetchError::authentication(QUERY_STAGE, format!("{what} is not a valid header value"))
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static("x-crumb"),
        HeaderValue::from_str(crumb).map_err(|_| invalid("crumb"))?,
    );
    headers.insert(COOKIE, HeaderValue::from_str(cookie).map_err(|_| invalid("cookie"))?);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use earncal_core::SessionCookie;
    use earncal_fetch::ErrorKind;

    #[test]
    fn test_auth_headers() {
        let headers = auth_headers("abc/1", "A3=d=1").unwrap();
        assert_eq!(headers.get("x-crumb").unwrap(), "abc/1");
        assert_eq!(headers.get("cookie").unwrap(), "A3=d=1");
    }

    #[test]
    fn test_auth_headers_rejects_control_chars() {
        let err = auth_headers("abc\n", "A3=d=1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_incomplete_credential_rejected_before_request() {
        // unroutable endpoint: reaching the network would fail differently
        let client = VisualizationClient::new(YahooEndpoints::with_base("http://127.0.0.1:9"));
        let ctx = FetchContext::new().unwrap();
        let request = super::super::query::QueryBuilder::new(
            chrono::NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
        )
        .build();

        for credential in [
            Credential::empty(),
            Credential::empty().with_cookie(SessionCookie::new("A3", "v")),
            Credential::empty().with_cookie(SessionCookie::new("A3", "v")).fail(),
        ] {
            let err = client.query(&ctx, &credential, &request).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authentication);
            assert_eq!(err.stage(), Some(QUERY_STAGE));
        }
    }
}
