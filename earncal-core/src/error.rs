//! Core error types for `earncal`.

use thiserror::Error;

/// Core error type for `earncal` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A credential transition that would break the credential invariant.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}
