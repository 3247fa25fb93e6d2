// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # earncal Store
//!
//! Persistent configuration for earncal.
//!
//! The configuration is a JSON file under the platform config directory.
//! A missing file is not an error; every field has a default.
//!
//! ```no_run
//! use earncal_store::Config;
//!
//! let config = Config::load()?;
//! let fetcher = config.fetcher()?;
//! # Ok::<(), earncal_store::StoreError>(())
//! ```

pub mod config;
pub mod error;

pub use config::{Config, EndpointOverrides, GeneralConfig, YahooConfig};
pub use error::StoreError;
