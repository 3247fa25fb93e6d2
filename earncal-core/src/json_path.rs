//! Typed optional-path lookup over `serde_json::Value`.
//!
//! Remote payloads are nested several levels deep and any level may be
//! absent. [`lookup`] walks a path of object keys and array indices and
//! returns `None` at the first missing step instead of panicking.
//!
//! ```
//! use earncal_core::json_path::{lookup, Segment};
//! use serde_json::json;
//!
//! let body = json!({"finance": {"result": [{"documents": []}]}});
//! let path = [Segment::from("finance"), "result".into(), Segment::Index(0), "documents".into()];
//! assert!(lookup(&body, &path).is_some());
//! ```

use std::fmt;

use serde_json::Value;

/// One step of a JSON path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Object member.
    Key(&'a str),
    /// Array element.
    Index(usize),
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(key: &'a str) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Segment<'_> {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, ".{key}"),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Follows `path` from `root`.
///
/// Returns `None` if any key is missing, any index is out of range, or a
/// step meets a value of the wrong shape.
pub fn lookup<'v>(root: &'v Value, path: &[Segment<'_>]) -> Option<&'v Value> {
    path.iter().try_fold(root, |value, segment| match segment {
        Segment::Key(key) => value.as_object()?.get(*key),
        Segment::Index(index) => value.as_array()?.get(*index),
    })
}

/// Renders a path for log messages, e.g. `finance.result[0]`.
pub fn describe(path: &[Segment<'_>]) -> String {
    let rendered: String = path.iter().map(ToString::to_string).collect();
    rendered.trim_start_matches('.').to_string()
}
