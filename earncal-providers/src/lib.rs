// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `earncal` Providers
//!
//! Provider implementations for `earncal`.
//!
//! Each provider module includes:
//!
//! - **Strategies**: Crumb strategy implementations
//! - **Query**: Request body construction
//! - **API**: Authenticated request execution
//! - **Parser**: Response normalization
//! - **Fetcher**: Per-date and date-range orchestration
//!
//! ## Supported Providers
//!
//! | Provider | Cookie Endpoint | Inline Script | Script Attribute | Embedded JSON |
//! |----------|-----------------|---------------|------------------|---------------|
//! | Yahoo Finance | ✅ | ✅ | ✅ | ✅ |
//!
//! ## Usage
//!
//! ```ignore
//! use earncal_providers::yahoo::EarningsFetcher;
//!
//! let fetcher = EarningsFetcher::new();
//! let outcome = fetcher.fetch_range(start, end).await;
//! for day in &outcome.days {
//!     println!("{}: {:?}", day.date, day.result.as_ref().map(|r| r.len()));
//! }
//! ```

pub mod yahoo;

pub use yahoo::{fetch_earnings_blocking, EarningsFetcher, YahooEndpoints, YahooError};
