//! Inline targets and editor cursor positions.

use serde::{Deserialize, Serialize};

/// A rewrite candidate accepted into a session.
///
/// Targets are unique by `name` within one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    /// Dotted object path the engine inlines (e.g. `seaborn.categorical.boxplot`).
    pub name: String,
    /// Source file of the defining module, or the selected text it was resolved from.
    pub path: String,
    /// Source snippet showing how the program uses the candidate.
    #[serde(rename = "use")]
    pub use_site: String,
}

impl Target {
    /// Construct a target from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>, use_site: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            use_site: use_site.into(),
        }
    }

    /// Construct a target known only by name, as typed in by a user.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, "", "")
    }
}

/// Position of the editor cursor inside the session's cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CursorPosition {
    /// 1-based line number.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

impl CursorPosition {
    /// Construct a cursor position.
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}
