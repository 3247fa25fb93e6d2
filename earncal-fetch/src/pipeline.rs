//! Crumb pipeline for executing strategies in order.
//!
//! The pipeline takes a list of crumb strategies and executes them in
//! priority order until one yields a complete credential. Individual
//! failures are logged and recorded; only exhaustion is an error.

use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::strategy::{CrumbResult, CrumbSource, CrumbStrategy, StrategyInfo};

/// Stage name used for errors raised by the pipeline.
pub const CRUMB_STAGE: &str = "crumb";

// ============================================================================
// Fetch Attempt
// ============================================================================

/// Record of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchAttempt {
    /// The strategy ID that was attempted.
    pub strategy_id: String,
    /// The crumb source used.
    pub kind: CrumbSource,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Error if the attempt failed.
    pub error: Option<String>,
    /// How long the attempt took.
    pub duration: Duration,
}

impl FetchAttempt {
    /// Creates a successful attempt record.
    pub fn success(strategy_id: impl Into<String>, kind: CrumbSource, duration: Duration) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            kind,
            success: true,
            error: None,
            duration,
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(
        strategy_id: impl Into<String>,
        kind: CrumbSource,
        error: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            kind,
            success: false,
            error: Some(error.into()),
            duration,
        }
    }
}

// ============================================================================
// Crumb Outcome
// ============================================================================

/// The outcome of a crumb pipeline execution.
#[derive(Debug)]
pub struct CrumbOutcome {
    /// The result (success or final error).
    pub result: Result<CrumbResult, FetchError>,
    /// All attempts made.
    pub attempts: Vec<FetchAttempt>,
    /// Total duration of all attempts.
    pub duration: Duration,
}

impl CrumbOutcome {
    /// Returns true if a credential was obtained.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the number of strategies that were tried.
    pub fn attempts_count(&self) -> usize {
        self.attempts.len()
    }

    /// Returns the successful strategy ID, if any.
    pub fn successful_strategy(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|r| r.strategy_id.as_str())
    }

    /// Returns all errors that occurred.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_deref())
            .collect()
    }

    /// Converts the outcome into its result.
    pub fn into_result(self) -> Result<CrumbResult, FetchError> {
        self.result
    }
}

// ============================================================================
// Crumb Pipeline
// ============================================================================

/// A pipeline of crumb strategies tried in order.
pub struct CrumbPipeline {
    strategies: Vec<Box<dyn CrumbStrategy>>,
}

impl CrumbPipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Creates a pipeline with the given strategies.
    pub fn with_strategies(strategies: Vec<Box<dyn CrumbStrategy>>) -> Self {
        let mut pipeline = Self { strategies };
        pipeline.sort_by_priority();
        pipeline
    }

    /// Sorts strategies by priority (highest first). Ties keep insertion order.
    fn sort_by_priority(&mut self) {
        self.strategies.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Returns the number of strategies in the pipeline.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if the pipeline is empty.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Returns information about all strategies, in execution order.
    pub fn strategy_info(&self) -> Vec<StrategyInfo> {
        self.strategies
            .iter()
            .map(|s| StrategyInfo::from_strategy(s.as_ref()))
            .collect()
    }

    /// Execute the pipeline, trying strategies in order until one succeeds.
    #[instrument(skip(self, ctx), fields(strategies = self.strategies.len()))]
    pub async fn execute(&self, ctx: &FetchContext) -> CrumbOutcome {
        let start = Instant::now();
        let mut attempts = Vec::with_capacity(self.strategies.len());

        if self.strategies.is_empty() {
            return CrumbOutcome {
                result: Err(FetchError::authentication(
                    CRUMB_STAGE,
                    "no crumb strategies configured",
                )),
                attempts,
                duration: start.elapsed(),
            };
        }

        info!(count = self.strategies.len(), "Executing crumb pipeline");

        for strategy in &self.strategies {
            let strategy_id = strategy.id();
            let kind = strategy.kind();
            let attempt_start = Instant::now();
            debug!(strategy = %strategy_id, kind = %kind, "Executing strategy");

            let error = match strategy.acquire(ctx).await {
                Ok(credential) if credential.is_complete() => {
                    let duration = attempt_start.elapsed();
                    info!(
                        strategy = %strategy_id,
                        duration = ?duration,
                        "Strategy succeeded"
                    );

                    attempts.push(FetchAttempt::success(strategy_id, kind, duration));

                    return CrumbOutcome {
                        result: Ok(CrumbResult::new(credential, strategy_id, kind)),
                        attempts,
                        duration: start.elapsed(),
                    };
                }
                Ok(credential) => format!(
                    "strategy returned an incomplete credential (state: {})",
                    credential.state()
                ),
                Err(error) => error.to_string(),
            };

            let duration = attempt_start.elapsed();
            warn!(
                strategy = %strategy_id,
                error = %error,
                duration = ?duration,
                "Strategy failed"
            );
            attempts.push(FetchAttempt::failure(strategy_id, kind, error, duration));
        }

        warn!(count = attempts.len(), "All crumb strategies failed");
        CrumbOutcome {
            result: Err(FetchError::Authentication {
                stage: CRUMB_STAGE,
                message: format!("all {} crumb strategies failed", attempts.len()),
                attempts: attempts.clone(),
            }),
            attempts,
            duration: start.elapsed(),
        }
    }
}

impl Default for CrumbPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CrumbPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrumbPipeline")
            .field("strategies", &self.strategy_info())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use earncal_core::{Credential, SessionCookie};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Succeed,
        Fail,
        Incomplete,
        GaveUp,
    }

    struct MockStrategy {
        id: String,
        kind: CrumbSource,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl MockStrategy {
        fn new(id: &str, kind: CrumbSource, behavior: Behavior) -> Self {
            Self {
                id: id.to_string(),
                kind,
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn counting(mut self, calls: &Arc<AtomicUsize>) -> Self {
            self.calls = Arc::clone(calls);
            self
        }
    }

    #[async_trait]
    impl CrumbStrategy for MockStrategy {
        fn id(&self) -> &str {
            &self.id
        }

        fn kind(&self) -> CrumbSource {
            self.kind
        }

        async fn acquire(&self, _ctx: &FetchContext) -> Result<Credential, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let cookie = Credential::empty().with_cookie(SessionCookie::new("A3", "v"));
            match self.behavior {
                Behavior::Succeed => Ok(cookie.with_crumb("crumb").unwrap()),
                Behavior::Fail => Err(FetchError::malformed("crumb", "mock error")),
                Behavior::Incomplete => Ok(cookie),
                Behavior::GaveUp => Ok(cookie.fail()),
            }
        }
    }

    fn ctx() -> FetchContext {
        FetchContext::new().unwrap()
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let outcome = CrumbPipeline::new().execute(&ctx()).await;

        assert!(!outcome.is_success());
        let err = outcome.result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_single_success() {
        let pipeline = CrumbPipeline::with_strategies(vec![Box::new(MockStrategy::new(
            "test.success",
            CrumbSource::CookieEndpoint,
            Behavior::Succeed,
        ))]);

        let outcome = pipeline.execute(&ctx()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts_count(), 1);
        assert_eq!(outcome.successful_strategy(), Some("test.success"));
        assert!(outcome.result.unwrap().credential.is_complete());
    }

    #[tokio::test]
    async fn test_fallback_in_priority_order() {
        // registered out of order on purpose
        let pipeline = CrumbPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("test.json", CrumbSource::EmbeddedJson, Behavior::Succeed)),
            Box::new(MockStrategy::new("test.endpoint", CrumbSource::CookieEndpoint, Behavior::Fail)),
            Box::new(MockStrategy::new("test.inline", CrumbSource::InlineScript, Behavior::Succeed)),
        ]);

        let ids: Vec<String> = pipeline.strategy_info().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["test.endpoint", "test.inline", "test.json"]);

        let outcome = pipeline.execute(&ctx()).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts_count(), 2);
        assert_eq!(outcome.successful_strategy(), Some("test.inline"));
        assert!(!outcome.attempts[0].success);
        assert!(outcome.attempts[1].success);
    }

    #[tokio::test]
    async fn test_halts_at_first_success() {
        let later = Arc::new(AtomicUsize::new(0));
        let pipeline = CrumbPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("a", CrumbSource::CookieEndpoint, Behavior::Succeed)),
            Box::new(
                MockStrategy::new("b", CrumbSource::InlineScript, Behavior::Succeed).counting(&later),
            ),
        ]);

        let outcome = pipeline.execute(&ctx()).await;
        assert_eq!(outcome.successful_strategy(), Some("a"));
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_incomplete_credential_is_failure() {
        let pipeline = CrumbPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("a", CrumbSource::CookieEndpoint, Behavior::Incomplete)),
            Box::new(MockStrategy::new("b", CrumbSource::InlineScript, Behavior::Succeed)),
        ]);

        let outcome = pipeline.execute(&ctx()).await;
        assert_eq!(outcome.successful_strategy(), Some("b"));
        assert!(outcome.attempts[0].error.as_deref().unwrap().contains("incomplete"));
    }

    #[tokio::test]
    async fn test_failed_credential_is_recorded_and_skipped() {
        let pipeline = CrumbPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("a", CrumbSource::CookieEndpoint, Behavior::GaveUp)),
            Box::new(MockStrategy::new("b", CrumbSource::InlineScript, Behavior::Succeed)),
        ]);

        let outcome = pipeline.execute(&ctx()).await;
        assert_eq!(outcome.successful_strategy(), Some("b"));
        assert!(!outcome.attempts[0].success);
        assert!(outcome.attempts[0].error.as_deref().unwrap().contains("state: failed"));
    }

    #[tokio::test]
    async fn test_exhaustion_yields_one_authentication_error() {
        let pipeline = CrumbPipeline::with_strategies(vec![
            Box::new(MockStrategy::new("a", CrumbSource::CookieEndpoint, Behavior::Fail)),
            Box::new(MockStrategy::new("b", CrumbSource::InlineScript, Behavior::Fail)),
            Box::new(MockStrategy::new("c", CrumbSource::ScriptAttribute, Behavior::Incomplete)),
            Box::new(MockStrategy::new("d", CrumbSource::EmbeddedJson, Behavior::Fail)),
        ]);

        let outcome = pipeline.execute(&ctx()).await;
        assert_eq!(outcome.attempts_count(), 4);
        assert_eq!(outcome.errors().len(), 4);

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.stage(), Some(CRUMB_STAGE));

        let ids: Vec<&str> = err.attempts().iter().map(|a| a.strategy_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);
    }
}
