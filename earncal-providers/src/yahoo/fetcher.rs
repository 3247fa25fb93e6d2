//! Main earnings calendar fetcher.
//!
//! One date is one operation: a fresh [`FetchContext`] (and so a fresh
//! cookie jar), the crumb chain, one authenticated query, normalization.
//!
//! # Example
//!
//! ```ignore
//! let fetcher = EarningsFetcher::new();
//! let results = fetcher.fetch_date(date).await?;
//! ```

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use earncal_core::ResultSet;
use earncal_fetch::{CrumbOutcome, FetchContext, FetchError, FetchSettings};
use tracing::{debug, info, instrument, warn};

use super::api::VisualizationClient;
use super::endpoints::YahooEndpoints;
use super::parser::normalize_response;
use super::query::{QueryBuilder, DEFAULT_REGION, MAX_PAGE_SIZE};
use super::strategies::build_crumb_pipeline;

/// Default pause between dates of a range.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);

// ============================================================================
// Range Outcome
// ============================================================================

/// Result for one date of a range.
#[derive(Debug)]
pub struct DateResult {
    /// The calendar date.
    pub date: NaiveDate,
    /// Its result set or the error that stopped it.
    pub result: Result<ResultSet, FetchError>,
}

/// Per-date results of a range fetch, in date order.
#[derive(Debug, Default)]
pub struct RangeOutcome {
    /// One entry per date.
    pub days: Vec<DateResult>,
    /// Total duration.
    pub duration: Duration,
}

impl RangeOutcome {
    /// Number of dates that succeeded.
    pub fn successes(&self) -> usize {
        self.days.iter().filter(|d| d.result.is_ok()).count()
    }

    /// Dates that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (NaiveDate, &FetchError)> {
        self.days
            .iter()
            .filter_map(|d| d.result.as_ref().err().map(|e| (d.date, e)))
    }

    /// All successful result sets merged in date order.
    pub fn merged(&self) -> ResultSet {
        let mut merged = ResultSet::empty();
        for set in self.days.iter().filter_map(|d| d.result.as_ref().ok()) {
            merged.merge(set.clone());
        }
        merged
    }
}

// ============================================================================
// Fetcher
// ============================================================================

/// Earnings calendar fetcher.
#[derive(Debug, Clone)]
pub struct EarningsFetcher {
    endpoints: YahooEndpoints,
    settings: FetchSettings,
    region: String,
    page_size: u32,
    request_delay: Duration,
}

impl Default for EarningsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EarningsFetcher {
    /// Creates a fetcher for the live endpoints with default settings.
    pub fn new() -> Self {
        Self {
            endpoints: YahooEndpoints::default(),
            settings: FetchSettings::default(),
            region: DEFAULT_REGION.to_string(),
            page_size: MAX_PAGE_SIZE,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    /// Uses other endpoints.
    pub fn with_endpoints(mut self, endpoints: YahooEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Uses other HTTP settings.
    pub fn with_settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the region filter.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Sets the page size (clamped by the query builder).
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the pause between dates of a range.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// The endpoints in use.
    pub fn endpoints(&self) -> &YahooEndpoints {
        &self.endpoints
    }

    /// Creates the per-operation context.
    pub fn context(&self) -> Result<FetchContext, FetchError> {
        FetchContext::with_settings(self.settings.clone())
    }

    /// Runs only the crumb chain for `date` in `ctx`.
    #[instrument(skip(self, ctx))]
    pub async fn acquire_credential(&self, ctx: &FetchContext, date: NaiveDate) -> CrumbOutcome {
        build_crumb_pipeline(date, &self.endpoints).execute(ctx).await
    }

    /// Fetches the earnings calendar for one date.
    #[instrument(skip(self))]
    pub async fn fetch_date(&self, date: NaiveDate) -> Result<ResultSet, FetchError> {
        let ctx = self.context()?;

        let outcome = self.acquire_credential(&ctx, date).await;
        let acquired = outcome.into_result()?;
        debug!(strategy = %acquired.strategy_id, "Credential acquired");

        let request = QueryBuilder::new(date)
            .region(self.region.as_str())
            .size(self.page_size)
            .build();
        let body = VisualizationClient::new(self.endpoints.clone())
            .query(&ctx, &acquired.credential, &request)
            .await?;

        let results = normalize_response(&body)?;
        if results.len() >= request.size as usize {
            warn!(
                rows = results.len(),
                "Result hit the page size; later events for this date are not fetched"
            );
        }
        info!(rows = results.len(), "Earnings calendar fetched");
        Ok(results)
    }

    /// Fetches every date in `start..=end`, one session per date, pausing
    /// between dates. A failed date does not stop the range.
    #[instrument(skip(self))]
    pub async fn fetch_range(&self, start: NaiveDate, end: NaiveDate) -> RangeOutcome {
        let started = Instant::now();
        let mut days = Vec::new();

        for (i, date) in start.iter_days().take_while(|d| *d <= end).enumerate() {
            if i > 0 && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }

            let result = self.fetch_date(date).await;
            if let Err(e) = &result {
                warn!(%date, error = %e, "Date failed");
            }
            days.push(DateResult { date, result });
        }

        let outcome = RangeOutcome {
            days,
            duration: started.elapsed(),
        };
        info!(
            dates = outcome.days.len(),
            succeeded = outcome.successes(),
            "Range fetch finished"
        );
        outcome
    }

    /// Blocking variant of [`EarningsFetcher::fetch_date`].
    ///
    /// Builds a current-thread runtime; must not be called from within an
    /// async context.
    pub fn fetch_date_blocking(&self, date: NaiveDate) -> Result<ResultSet, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| FetchError::Config(format!("failed to start runtime: {e}")))?;
        runtime.block_on(self.fetch_date(date))
    }
}

/// Fetches one date from the live endpoints with default settings, blocking
/// the calling thread.
pub fn fetch_earnings_blocking(date: NaiveDate) -> Result<ResultSet, FetchError> {
    EarningsFetcher::new().fetch_date_blocking(date)
}
