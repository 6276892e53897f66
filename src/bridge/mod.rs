//! Command bridge between the session orchestrator and the execution
//! environment.
//!
//! Each method builds one Python command (see [`commands`]), runs it through
//! the shared [`ExecutionEnvironment`], and parses the reply (see [`reply`]).
//! The bridge is stateless apart from the name of the remote object it
//! drives.

pub mod commands;
pub mod reply;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::is_identifier;
use crate::kernel::ExecutionEnvironment;
use crate::models::suggestion::Suggestions;
use crate::models::target::{CursorPosition, Target};
use crate::{AppError, Result};

/// Handle on one remote `InteractiveInliner` object.
#[derive(Clone)]
pub struct CommandBridge {
    object: String,
    env: Arc<dyn ExecutionEnvironment>,
}

impl fmt::Debug for CommandBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBridge")
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}

impl CommandBridge {
    /// Bind a bridge to the remote object named `object`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if `object` is not a Python identifier.
    pub fn new(object: impl Into<String>, env: Arc<dyn ExecutionEnvironment>) -> Result<Self> {
        let object = object.into();
        if !is_identifier(&object) {
            return Err(AppError::Config(format!(
                "remote object name must be an identifier, got {object:?}"
            )));
        }
        Ok(Self { object, env })
    }

    /// Name of the remote object.
    #[must_use]
    pub fn object_name(&self) -> &str {
        &self.object
    }

    async fn check_call(&self, operation: &str, source: &str) -> Result<()> {
        debug!(object = self.object, operation, "bridge: call");
        self.env
            .execute(source, false)
            .await
            .map(|_| ())
            .map_err(|e| e.with_operation(operation))
    }

    async fn check_output(&self, operation: &str, source: &str) -> Result<String> {
        debug!(object = self.object, operation, "bridge: call with output");
        let output = self
            .env
            .execute(source, true)
            .await
            .map_err(|e| e.with_operation(operation))?;
        Ok(output.unwrap_or_default())
    }

    /// Create the remote object from `source_text`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] if the engine cannot be imported or the
    /// program cannot be parsed.
    pub async fn setup(&self, source_text: &str) -> Result<()> {
        self.check_call("setup", &commands::setup(&self.object, source_text))
            .await
    }

    /// Canonical regenerated program text, trailing whitespace trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn current_program_text(&self) -> Result<String> {
        let output = self
            .check_output("program_text", &commands::program_text(&self.object))
            .await?;
        Ok(output.trim_end().to_owned())
    }

    /// Inline candidates currently offered by the engine.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure or a malformed payload.
    pub async fn list_suggestions(&self) -> Result<Suggestions> {
        let operation = "target_suggestions";
        let output = self
            .check_output(operation, &commands::target_suggestions(&self.object))
            .await?;
        reply::suggestions(operation, &output)
    }

    /// Line numbers the editor should collapse.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure or a malformed payload.
    pub async fn fold_ranges(&self) -> Result<Vec<u32>> {
        let operation = "code_folding";
        let output = self
            .check_output(operation, &commands::code_folding(&self.object))
            .await?;
        reply::fold_lines(operation, &output)
    }

    /// Roll back the remote object's last mutation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn undo(&self) -> Result<()> {
        self.check_call("undo", &commands::undo(&self.object)).await
    }

    /// Run pass `name`, optionally to local convergence, and report whether
    /// the program changed.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] if `name` is not an identifier.
    /// - [`AppError::Remote`] on engine failure or when the last output line
    ///   is not `True`/`False`.
    pub async fn run_pass(&self, name: &str, fixpoint: bool) -> Result<bool> {
        if !is_identifier(name) {
            return Err(AppError::Precondition(format!("invalid pass name: {name:?}")));
        }
        let operation = format!("run_pass:{name}");
        let output = self
            .check_output(&operation, &commands::run_pass(&self.object, name, fixpoint))
            .await?;
        reply::pass_changed(&operation, name, &output)
    }

    /// Add a cursor-identified target to the remote object only.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn add_cursor_target(&self, cursor: CursorPosition) -> Result<()> {
        self.check_call(
            "add_cursor_target",
            &commands::add_cursor_target(&self.object, cursor),
        )
        .await
    }

    /// Replace the remote target list with `targets`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn sync_targets(&self, targets: &[Target]) -> Result<()> {
        self.check_call("sync_targets", &commands::sync_targets(&self.object, targets))
            .await
    }

    /// Name of the most recently applied pass, for error context.
    ///
    /// Never fails: engine errors and an empty history both yield `None`.
    pub async fn last_pass_name(&self) -> Option<String> {
        match self
            .check_output("last_pass", &commands::last_pass(&self.object))
            .await
        {
            Ok(output) => reply::last_pass(&output),
            Err(err) => {
                warn!(object = self.object, %err, "bridge: last pass lookup failed");
                None
            }
        }
    }

    /// Diagnostic dump of the engine's history as a reproduction script.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn debug(&self) -> Result<String> {
        self.check_output("debug", &commands::debug(&self.object))
            .await
    }

    /// Resolve a source expression to the dotted path of the object it names.
    ///
    /// # Errors
    ///
    /// - [`AppError::Remote`] if evaluation fails.
    /// - [`AppError::NotFound`] if the object has no importable path.
    pub async fn resolve_object_path(&self, source_expression: &str) -> Result<String> {
        let output = self
            .check_output(
                "object_path",
                &commands::object_path(&self.object, source_expression),
            )
            .await?;
        reply::object_path(source_expression, &output)
    }
}
