//! Yahoo-specific error types.

use earncal_fetch::{FetchError, HttpError, CRUMB_STAGE};
use thiserror::Error;

/// Errors raised while probing for a cookie or crumb.
///
/// `Clone` so a failed calendar page fetch can be cached and reported by
/// every strategy that shares it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YahooError {
    /// No cookie was issued.
    #[error("No cookie issued by {0}")]
    CookieMissing(String),

    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus {
        /// Which endpoint answered.
        endpoint: &'static str,
        /// Status code.
        status: u16,
    },

    /// The provider asked us to slow down.
    #[error("Rate limited by {0}")]
    RateLimited(&'static str),

    /// A crumb candidate failed validation.
    #[error("Crumb rejected: {0}")]
    CrumbRejected(String),

    /// The page does not contain what the strategy looks for.
    #[error("Not found in calendar page: {0}")]
    NotFound(&'static str),

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<HttpError> for YahooError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Timeout(secs) => YahooError::Timeout(secs),
            HttpError::InvalidUrl(url) => YahooError::InvalidUrl(url),
            other => YahooError::Http(other.to_string()),
        }
    }
}

impl From<YahooError> for FetchError {
    fn from(e: YahooError) -> Self {
        match e {
            YahooError::Http(message) => FetchError::Network {
                stage: CRUMB_STAGE,
                message,
            },
            YahooError::Timeout(secs) => FetchError::Timeout {
                stage: CRUMB_STAGE,
                secs,
            },
            YahooError::InvalidUrl(url) => FetchError::Config(format!("invalid URL: {url}")),
            YahooError::CookieMissing(_)
            | YahooError::HttpStatus { .. }
            | YahooError::RateLimited(_) => FetchError::authentication(CRUMB_STAGE, e.to_string()),
            YahooError::CrumbRejected(_) | YahooError::NotFound(_) => {
                FetchError::malformed(CRUMB_STAGE, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use earncal_fetch::ErrorKind;

    #[test]
    fn test_conversion_kinds() {
        let cases = [
            (YahooError::Http("reset".into()), ErrorKind::Network),
            (YahooError::Timeout(30), ErrorKind::Network),
            (YahooError::InvalidUrl("x".into()), ErrorKind::Config),
            (YahooError::RateLimited("crumb endpoint"), ErrorKind::Authentication),
            (YahooError::NotFound("CrumbStore"), ErrorKind::MalformedResponse),
        ];
        for (error, kind) in cases {
            assert_eq!(FetchError::from(error).kind(), kind);
        }
    }

    #[test]
    fn test_from_http_timeout() {
        assert_eq!(YahooError::from(HttpError::Timeout(7)), YahooError::Timeout(7));
    }
}
