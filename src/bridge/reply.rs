//! Parsers for the textual replies of bridge commands.

use crate::models::suggestion::Suggestions;
use crate::{AppError, Result};

/// Interpret the output of a pass command.
///
/// A pass may print diagnostics before its verdict, so only the final line
/// is inspected; it must be exactly `True` or `False`.
///
/// # Errors
///
/// Returns [`AppError::Remote`] carrying the whole output otherwise.
pub fn pass_changed(operation: &str, pass: &str, output: &str) -> Result<bool> {
    let output = output.trim();
    match output.lines().last().map(str::trim_end) {
        Some("True") => Ok(true),
        Some("False") => Ok(false),
        _ => Err(AppError::remote(operation, format!("{pass}: {output}"))),
    }
}

/// Parse the JSON candidate map.
///
/// # Errors
///
/// Returns [`AppError::Remote`] when the payload is not a name → metadata map.
pub fn suggestions(operation: &str, output: &str) -> Result<Suggestions> {
    serde_json::from_str(output.trim())
        .map_err(|e| AppError::remote(operation, format!("invalid suggestions payload: {e}: {output}")))
}

/// Parse the JSON list of foldable line numbers.
///
/// # Errors
///
/// Returns [`AppError::Remote`] when the payload is not a list of line numbers.
pub fn fold_lines(operation: &str, output: &str) -> Result<Vec<u32>> {
    serde_json::from_str(output.trim())
        .map_err(|e| AppError::remote(operation, format!("invalid folding payload: {e}: {output}")))
}

/// Interpret the printed last pass; Python's `None` means no pass yet.
#[must_use]
pub fn last_pass(output: &str) -> Option<String> {
    match output.trim() {
        "" | "None" => None,
        name => Some(name.to_owned()),
    }
}

/// Interpret the printed object path for `expression`.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when the engine could not name the object.
pub fn object_path(expression: &str, output: &str) -> Result<String> {
    match output.trim() {
        "" | "None" => Err(AppError::NotFound(format!(
            "no importable object for {expression:?}"
        ))),
        path => Ok(path.to_owned()),
    }
}
