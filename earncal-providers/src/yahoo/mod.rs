//! Yahoo Finance earnings calendar provider.
//!
//! Yahoo exposes no public API for the earnings calendar. The web app reads
//! it from an internal visualization endpoint that requires a session cookie
//! plus a matching anti-forgery token (the "crumb").
//!
//! ## Crumb Strategies
//!
//! 1. **Cookie endpoint** (priority 100): `fc.yahoo.com` issues the cookie,
//!    `/v1/test/getcrumb` returns the crumb
//! 2. **Inline script** (priority 80): `"CrumbStore":{"crumb":"..."}` in the
//!    calendar page
//! 3. **Script attribute** (priority 60): follows a
//!    `<script data-url="...getcrumb...">` URL
//! 4. **Embedded JSON** (priority 40): `body` field of a JSON script
//!
//! Strategies 2-4 share one fetch of the calendar page.
//!
//! ## Query
//!
//! `POST /v1/finance/visualization?lang=en-US&region=US&crumb=<crumb>` with
//! `x-crumb` and `Cookie` headers and a JSON filter body. Pages are capped at
//! 250 rows; more events on a single date are not fetched.
//!
//! ## Usage
//!
//! ```ignore
//! use earncal_providers::yahoo::EarningsFetcher;
//!
//! let fetcher = EarningsFetcher::new();
//! let results = fetcher.fetch_date(date).await?;
//! ```

// Modules
mod api;
mod endpoints;
mod error;
mod fetcher;
mod page;
pub(crate) mod parser;
mod query;
mod strategies;

// Re-exports
pub use api::{VisualizationClient, QUERY_STAGE};
pub use endpoints::YahooEndpoints;
pub use error::YahooError;
pub use fetcher::{
    fetch_earnings_blocking, DateResult, EarningsFetcher, RangeOutcome, DEFAULT_REQUEST_DELAY,
};
pub use page::{CalendarPage, PageSnapshot};
pub use parser::{normalize, normalize_response, RawColumn, RawDocument, NORMALIZE_STAGE};
pub use query::{
    FilterExpression, Operand, Operator, QueryBuilder, QueryRequest, DEFAULT_REGION,
    INCLUDE_FIELDS, MAX_PAGE_SIZE, SORT_DESCENDING,
};
pub use strategies::{
    build_crumb_pipeline, validate_crumb, CookieCrumbStrategy, EmbeddedJsonStrategy,
    InlineScriptStrategy, ScriptAttributeStrategy,
};
