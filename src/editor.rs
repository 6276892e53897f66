//! Editor collaborator interface.
//!
//! The orchestrator never renders anything. It pushes program text, fold
//! requests and error reports to the host through this trait and reads the
//! user's selection and cursor back from it.

use crate::models::target::CursorPosition;

/// Host editing surface bound to one session's cell.
pub trait Editor: Send + Sync {
    /// Replace the cell's text with the current program.
    fn set_cell_text(&self, text: &str);

    /// Collapse the given 1-based lines.
    fn fold_lines(&self, lines: &[u32]);

    /// Currently selected text, if any.
    fn selected_text(&self) -> Option<String>;

    /// Cursor position, or `None` when the cursor is not inside code.
    fn cursor_position(&self) -> Option<CursorPosition>;

    /// Open a new cell below the session's cell containing `text`.
    fn create_new_cell(&self, text: &str);

    /// Present a rendered error report to the user.
    fn show_error(&self, rendered: &str);
}
