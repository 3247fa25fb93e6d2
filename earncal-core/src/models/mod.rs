//! Domain models for `earncal`.
//!
//! ## Submodules
//!
//! - [`credential`] - Session cookie and crumb with validity state
//! - [`earnings`] - Normalized earnings records and result sets

mod credential;
mod earnings;

pub use credential::{Credential, CredentialState, SessionCookie};
pub use earnings::{
    columns, Cell, EarningsRecord, ResultSet, EASTERN, STANDARD_COLUMNS,
};
