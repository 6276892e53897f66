//! Python command builders for the remote `InteractiveInliner` object.
//!
//! User-supplied strings are embedded as JSON string literals, which Python
//! parses as equivalent string literals, so arbitrary source text is safe to
//! splice in. Object and pass names are identifiers checked by the caller.

use crate::models::target::{CursorPosition, Target};

/// Render `value` as a Python string literal.
#[must_use]
pub fn py_str(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// Import the engine and bind `object` to a fresh inliner over `source`.
#[must_use]
pub fn setup(object: &str, source: &str) -> String {
    format!(
        "from inliner import InteractiveInliner\n\
         from inliner.targets import CursorTarget\n\
         import json\n\
         {object} = InteractiveInliner({source}, globls=globals())",
        source = py_str(source)
    )
}

/// Print the regenerated program source.
#[must_use]
pub fn program_text(object: &str) -> String {
    format!("print({object}.code())")
}

/// Print the candidate map as JSON.
#[must_use]
pub fn target_suggestions(object: &str) -> String {
    format!("print(json.dumps({object}.target_suggestions()))")
}

/// Print the foldable line numbers as JSON.
#[must_use]
pub fn code_folding(object: &str) -> String {
    format!("print(json.dumps({object}.code_folding()))")
}

/// Roll back the last mutation.
#[must_use]
pub fn undo(object: &str) -> String {
    format!("{object}.undo()")
}

/// Run `pass` once, or to local convergence through the engine's fixpoint
/// helper, printing whether anything changed.
#[must_use]
pub fn run_pass(object: &str, pass: &str, fixpoint: bool) -> String {
    let inner = format!("{object}.run_pass({})", py_str(pass));
    if fixpoint {
        format!("print({object}.fixpoint(lambda: {inner}))")
    } else {
        format!("print({inner})")
    }
}

/// Add a target identified by a source position.
#[must_use]
pub fn add_cursor_target(object: &str, cursor: CursorPosition) -> String {
    format!(
        "{object}.add_target(CursorTarget(({line}, {column})))",
        line = cursor.line,
        column = cursor.column
    )
}

/// Replace the remote target list with the names of `targets`, in order.
#[must_use]
pub fn sync_targets(object: &str, targets: &[Target]) -> String {
    let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
    let names_json = serde_json::Value::from(names).to_string();
    format!(
        "for _target in list({object}.targets):\n    \
         {object}.remove_target(_target)\n\
         for _name in json.loads({names}):\n    \
         {object}.add_target(_name)",
        names = py_str(&names_json)
    )
}

/// Print the pass recorded in the newest history entry.
#[must_use]
pub fn last_pass(object: &str) -> String {
    format!("print({object}.history[-1][1])")
}

/// Print the engine's diagnostic reproduction script.
#[must_use]
pub fn debug(object: &str) -> String {
    format!("print({object}.debug())")
}

/// Evaluate `expression` in the traced program's globals and print its
/// module/attribute path.
#[must_use]
pub fn object_path(object: &str, expression: &str) -> String {
    let inner = format!(
        "from inliner.visitors import object_path\nprint(object_path({expression}))"
    );
    format!(
        "_tracer = {object}.execute()\nexec({inner}, _tracer.globls)",
        inner = py_str(&inner)
    )
}
