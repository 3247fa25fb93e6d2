// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `earncal` Fetch
//!
//! HTTP session and crumb acquisition infrastructure.
//!
//! ## Host APIs
//!
//! - [`host::http`] - Cookie-jar session with a fixed browser User-Agent
//!
//! ## Crumb Pipeline
//!
//! The pipeline executes multiple crumb strategies in priority order:
//!
//! - [`strategy::CrumbStrategy`] - Trait for crumb discovery methods
//! - [`pipeline::CrumbPipeline`] - Executes strategies in order
//! - [`context::FetchContext`] - Per-operation session and settings
//!
//! ## Example
//!
//! ```ignore
//! use earncal_fetch::{CrumbPipeline, FetchContext};
//!
//! let ctx = FetchContext::new()?;
//! let pipeline = CrumbPipeline::with_strategies(vec![
//!     Box::new(CookieCrumbStrategy::new(endpoints.clone())),
//!     Box::new(InlineScriptStrategy::new(page.clone())),
//! ]);
//!
//! let outcome = pipeline.execute(&ctx).await;
//! ```

pub mod context;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod strategy;

// Errors
pub use error::{ErrorKind, FetchError, HttpError};

// Host APIs
pub use host::http::{first_response_cookie, Session, BROWSER_USER_AGENT};

// Strategy & Pipeline
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
pub use pipeline::{CrumbOutcome, CrumbPipeline, FetchAttempt, CRUMB_STAGE};
pub use strategy::{CrumbResult, CrumbSource, CrumbStrategy, StrategyInfo};
