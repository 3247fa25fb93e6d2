//! Session credential types.
//!
//! A query against the visualization endpoint is only authorized when the
//! same cookie and crumb are presented together. [`Credential`] bundles
//! the two with an explicit [`CredentialState`] so downstream code never
//! has to guess whether a pair is usable.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Session Cookie
// ============================================================================

/// A single cookie issued by the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Cookie name (e.g. `A3`).
    pub name: String,
    /// Cookie value.
    pub value: String,
}

impl SessionCookie {
    /// Creates a new cookie.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parses the first `name=value` pair of a `Cookie` header.
    pub fn from_header(header: &str) -> Option<Self> {
        let first = header.split(';').next()?.trim();
        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value.trim()))
    }

    /// Renders the cookie as a `Cookie` header value.
    pub fn header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("value", &format_args!("<{} bytes>", self.value.len()))
            .finish()
    }
}

// ============================================================================
// Credential State
// ============================================================================

/// Validity state of a [`Credential`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialState {
    /// Nothing obtained yet.
    #[default]
    Empty,
    /// A cookie was obtained but no crumb yet.
    CookieOnly,
    /// Cookie and non-empty crumb are both present.
    Complete,
    /// Set through [`Credential::fail`] to keep a dead credential around
    /// for diagnostics. It is informational only: the crumb chain treats
    /// it like any other non-complete state and records a failed attempt.
    Failed,
}

impl CredentialState {
    /// Returns the display name for this state.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::CookieOnly => "cookie only",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Credential
// ============================================================================

/// Cookie + crumb pair for one session.
///
/// The fields are private and only change through the transition methods,
/// which keeps `state == Complete` equivalent to "cookie present and crumb
/// present and non-empty".
///
/// ```
/// use earncal_core::{Credential, CredentialState, SessionCookie};
///
/// let credential = Credential::empty()
///     .with_cookie(SessionCookie::new("A3", "d=abc"))
///     .with_crumb(" Xy1/Z ")
///     .unwrap();
///
/// assert_eq!(credential.state(), CredentialState::Complete);
/// assert_eq!(credential.crumb(), Some("Xy1/Z"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    cookie: Option<SessionCookie>,
    crumb: Option<String>,
    state: CredentialState,
}

impl Credential {
    /// Creates an empty credential.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attaches a cookie, moving to [`CredentialState::CookieOnly`].
    ///
    /// Any crumb obtained under a previous cookie is dropped.
    pub fn with_cookie(self, cookie: SessionCookie) -> Self {
        Self {
            cookie: Some(cookie),
            crumb: None,
            state: CredentialState::CookieOnly,
        }
    }

    /// Attaches a crumb, moving to [`CredentialState::Complete`].
    ///
    /// The crumb is trimmed. Fails when no cookie is attached or the
    /// trimmed crumb is empty.
    pub fn with_crumb(self, crumb: impl AsRef<str>) -> Result<Self, CoreError> {
        let crumb = crumb.as_ref().trim();

        if self.state != CredentialState::CookieOnly || self.cookie.is_none() {
            return Err(CoreError::InvalidCredential(format!(
                "crumb requires a cookie first (state: {})",
                self.state
            )));
        }
        if crumb.is_empty() {
            return Err(CoreError::InvalidCredential("crumb is empty".to_string()));
        }

        Ok(Self {
            cookie: self.cookie,
            crumb: Some(crumb.to_string()),
            state: CredentialState::Complete,
        })
    }

    /// Marks the credential as failed. The cookie is kept for diagnostics.
    pub fn fail(self) -> Self {
        Self {
            cookie: self.cookie,
            crumb: None,
            state: CredentialState::Failed,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> CredentialState {
        self.state
    }

    /// Returns true if the credential can authorize a query.
    pub fn is_complete(&self) -> bool {
        self.state == CredentialState::Complete
    }

    /// Returns the cookie, if any.
    pub fn cookie(&self) -> Option<&SessionCookie> {
        self.cookie.as_ref()
    }

    /// Returns the crumb, if any.
    pub fn crumb(&self) -> Option<&str> {
        self.crumb.as_deref()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("cookie", &self.cookie)
            .field("crumb", &self.crumb.as_ref().map(|c| format!("<{} chars>", c.len())))
            .field("state", &self.state)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie() -> SessionCookie {
        SessionCookie::new("A3", "d=AQABBK")
    }

    #[test]
    fn test_empty_credential() {
        let credential = Credential::empty();
        assert_eq!(credential.state(), CredentialState::Empty);
        assert!(credential.cookie().is_none());
        assert!(credential.crumb().is_none());
        assert!(!credential.is_complete());
    }

    #[test]
    fn test_cookie_then_crumb_is_complete() {
        let credential = Credential::empty().with_cookie(cookie());
        assert_eq!(credential.state(), CredentialState::CookieOnly);

        let credential = credential.with_crumb("abc123").unwrap();
        assert!(credential.is_complete());
        assert_eq!(credential.crumb(), Some("abc123"));
        assert_eq!(credential.cookie(), Some(&cookie()));
    }

    #[test]
    fn test_crumb_without_cookie_is_rejected() {
        let result = Credential::empty().with_crumb("abc123");
        assert!(matches!(result, Err(CoreError::InvalidCredential(_))));
    }

    #[test]
    fn test_blank_crumb_is_rejected() {
        let result = Credential::empty().with_cookie(cookie()).with_crumb("  \n ");
        assert!(result.is_err());
    }

    #[test]
    fn test_crumb_is_trimmed() {
        let credential = Credential::empty()
            .with_cookie(cookie())
            .with_crumb("\tabc123\n")
            .unwrap();
        assert_eq!(credential.crumb(), Some("abc123"));
    }

    #[test]
    fn test_failed_drops_crumb_keeps_cookie() {
        let credential = Credential::empty().with_cookie(cookie()).fail();
        assert_eq!(credential.state(), CredentialState::Failed);
        assert!(credential.cookie().is_some());
        assert!(credential.crumb().is_none());
        assert!(credential.clone().with_crumb("abc").is_err());
    }

    #[test]
    fn test_new_cookie_resets_crumb() {
        let credential = Credential::empty()
            .with_cookie(cookie())
            .with_crumb("abc")
            .unwrap()
            .with_cookie(SessionCookie::new("B", "other"));
        assert_eq!(credential.state(), CredentialState::CookieOnly);
        assert!(credential.crumb().is_none());
    }

    #[test]
    fn test_cookie_header_value() {
        assert_eq!(cookie().header_value(), "A3=d=AQABBK");
    }

    #[test]
    fn test_cookie_from_header() {
        let parsed = SessionCookie::from_header("A3=d=AQABBK; A1=xyz").unwrap();
        assert_eq!(parsed.name, "A3");
        assert_eq!(parsed.value, "d=AQABBK");

        assert!(SessionCookie::from_header("").is_none());
        assert!(SessionCookie::from_header("=value").is_none());
        assert!(SessionCookie::from_header("novalue").is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credential = Credential::empty()
            .with_cookie(SessionCookie::new("A3", "secret-cookie"))
            .with_crumb("secret-crumb")
            .unwrap();
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret-cookie"));
        assert!(!debug.contains("secret-crumb"));
        assert!(debug.contains("A3"));
    }
}
