//! CLI command implementations.

pub mod config;
pub mod crumb;
pub mod fetch;
