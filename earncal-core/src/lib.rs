// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `earncal` Core
//!
//! Core types and models shared by the `earncal` crates.
//!
//! - Session credentials (cookie + crumb) with an explicit validity state
//! - Normalized earnings records and the ordered result set
//! - A typed optional-path lookup for navigating unstable JSON payloads
//!
//! ## Key Types
//!
//! ### Credentials
//! - [`SessionCookie`] - A single `name=value` cookie issued by the provider
//! - [`Credential`] - Cookie + crumb pair with a [`CredentialState`]
//!
//! ### Earnings
//! - [`EarningsRecord`] - One normalized calendar row
//! - [`ResultSet`] - Ordered records with a stable column header list
//! - [`Cell`] - A borrowed view of one value in a record

pub mod error;
pub mod json_path;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Credentials
    Credential,
    CredentialState,
    SessionCookie,
    // Earnings
    columns,
    Cell,
    EarningsRecord,
    ResultSet,
    EASTERN,
    STANDARD_COLUMNS,
};

pub use json_path::{lookup, Segment};
