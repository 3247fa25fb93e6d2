//! Crumb strategy trait and types.
//!
//! A strategy is one method of obtaining a cookie + crumb pair. The
//! provider exposes several undocumented ones; they are tried in priority
//! order by the [`crate::CrumbPipeline`].

use std::fmt;

use async_trait::async_trait;
use earncal_core::Credential;
use serde::{Deserialize, Serialize};

use crate::context::FetchContext;
use crate::error::FetchError;

// ============================================================================
// Crumb Source
// ============================================================================

/// Where a strategy finds its crumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrumbSource {
    /// Dedicated cookie issuance and crumb endpoints.
    CookieEndpoint,
    /// A `CrumbStore` literal in the page's inline scripts.
    InlineScript,
    /// A crumb URL advertised by a script element's `data-url`.
    ScriptAttribute,
    /// A JSON payload embedded in a script element.
    EmbeddedJson,
}

impl CrumbSource {
    /// Returns the display name for this source.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CookieEndpoint => "Cookie Endpoint",
            Self::InlineScript => "Inline Script",
            Self::ScriptAttribute => "Script Attribute",
            Self::EmbeddedJson => "Embedded JSON",
        }
    }

    /// Default priority for strategies of this source (higher = first).
    pub fn default_priority(&self) -> u32 {
        match self {
            Self::CookieEndpoint => 100,
            Self::InlineScript => 80,
            Self::ScriptAttribute => 60,
            Self::EmbeddedJson => 40,
        }
    }
}

impl fmt::Display for CrumbSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Crumb Result
// ============================================================================

/// A credential produced by a successful strategy.
#[derive(Debug, Clone)]
pub struct CrumbResult {
    /// The complete credential.
    pub credential: Credential,
    /// The strategy that succeeded.
    pub strategy_id: String,
    /// The source of the crumb.
    pub kind: CrumbSource,
}

impl CrumbResult {
    /// Creates a new crumb result.
    pub fn new(credential: Credential, strategy_id: impl Into<String>, kind: CrumbSource) -> Self {
        Self {
            credential,
            strategy_id: strategy_id.into(),
            kind,
        }
    }
}

// ============================================================================
// Crumb Strategy Trait
// ============================================================================

/// A strategy for obtaining a session credential.
///
/// ## Implementing a Strategy
///
/// ```ignore
/// struct EndpointStrategy;
///
/// #[async_trait]
/// impl CrumbStrategy for EndpointStrategy {
///     fn id(&self) -> &str {
///         "yahoo.cookie_crumb"
///     }
///
///     fn kind(&self) -> CrumbSource {
///         CrumbSource::CookieEndpoint
///     }
///
///     async fn acquire(&self, ctx: &FetchContext) -> Result<Credential, FetchError> {
///         // GET the cookie endpoint, then the crumb endpoint
///     }
/// }
/// ```
#[async_trait]
pub trait CrumbStrategy: Send + Sync {
    /// Unique identifier for this strategy.
    ///
    /// Format: `{provider}.{method}`
    fn id(&self) -> &str;

    /// Where this strategy finds its crumb.
    fn kind(&self) -> CrumbSource;

    /// Human-readable name for this strategy.
    fn display_name(&self) -> String {
        format!("{} ({})", self.id(), self.kind().display_name())
    }

    /// Obtains a credential.
    ///
    /// Anything other than an `Ok` credential in the `Complete` state counts
    /// as a failure of this strategy.
    async fn acquire(&self, ctx: &FetchContext) -> Result<Credential, FetchError>;

    /// Priority of this strategy (higher = try first).
    fn priority(&self) -> u32 {
        self.kind().default_priority()
    }
}

// ============================================================================
// Strategy Info
// ============================================================================

/// Information about a strategy (for reporting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Strategy ID.
    pub id: String,
    /// Crumb source.
    pub kind: CrumbSource,
    /// Priority.
    pub priority: u32,
}

impl StrategyInfo {
    /// Creates strategy info from a strategy implementation.
    pub fn from_strategy(strategy: &dyn CrumbStrategy) -> Self {
        Self {
            id: strategy.id().to_string(),
            kind: strategy.kind(),
            priority: strategy.priority(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
