//! Output formatting for CLI.

mod json;
mod text;

pub use json::{CrumbReport, JsonFormatter};
pub use text::TextFormatter;
#[cfg(test)]
mod tests;
