//! Transform session: the state machine for one editing target.
//!
//! A session owns the accepted targets, the outstanding suggestions and the
//! program history for one cell, plus the [`CommandBridge`] to the remote
//! inliner object. Every operation that mutates the remote program re-pulls
//! the canonical program text afterwards instead of predicting it locally.
//!
//! Target edits are pushed to the engine explicitly: each edit awaits
//! `sync_targets` and only commits locally once the engine accepted the new
//! list.

pub mod busy;
pub mod scheduler;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bridge::CommandBridge;
use crate::config::{GlobalConfig, SuggestionConfig};
use crate::editor::Editor;
use crate::models::history::ProgramHistory;
use crate::models::suggestion::{display_options, without_targets, SuggestionOption, Suggestions};
use crate::models::target::{CursorPosition, Target};
use crate::session::busy::BusyIndicator;
use crate::session::scheduler::{run_plan, OptimizePlan, OptimizeReport, PassFuture, PassRunner};
use crate::{AppError, Result};

/// Name of the pass that consumes the target list.
pub const INLINE_PASS: &str = "inline";

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created; the remote object does not exist yet.
    Uninitialized,
    /// Remote object created and first snapshot taken.
    Ready,
}

/// Per-cell transformation session.
pub struct TransformSession {
    id: String,
    state: SessionState,
    targets: Vec<Target>,
    suggestions: Suggestions,
    history: ProgramHistory,
    cursor_target_pending: bool,
    bridge: CommandBridge,
    editor: Arc<dyn Editor>,
    busy: BusyIndicator,
    plan: OptimizePlan,
    suggestion_config: SuggestionConfig,
}

impl std::fmt::Debug for TransformSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("targets", &self.targets)
            .field("history_len", &self.history.len())
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl TransformSession {
    /// Create an uninitialized session for cell `id`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        bridge: CommandBridge,
        editor: Arc<dyn Editor>,
        busy: BusyIndicator,
        config: &GlobalConfig,
    ) -> Self {
        Self {
            id: id.into(),
            state: SessionState::Uninitialized,
            targets: Vec::new(),
            suggestions: Suggestions::new(),
            history: ProgramHistory::new(),
            cursor_target_pending: false,
            bridge,
            editor,
            busy,
            plan: OptimizePlan::from_config(&config.optimize),
            suggestion_config: config.suggestions.clone(),
        }
    }

    /// Identifier of the editing target this session is bound to.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Accepted targets, in the order they are sent to the engine.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Candidates offered by the engine and not yet accepted.
    #[must_use]
    pub fn suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    /// Program snapshots.
    #[must_use]
    pub fn history(&self) -> &ProgramHistory {
        &self.history
    }

    /// `(before, after)` texts of the most recent change, for diff views.
    #[must_use]
    pub fn last_change(&self) -> Option<(&str, &str)> {
        self.history.last_change()
    }

    /// Bridge to the remote object.
    #[must_use]
    pub fn bridge(&self) -> &CommandBridge {
        &self.bridge
    }

    /// Suggestions as picker options, sorted by label, with hidden modules
    /// filtered out unless developer mode is on.
    #[must_use]
    pub fn suggestion_options(&self) -> Vec<SuggestionOption> {
        display_options(
            &self.suggestions,
            &self.suggestion_config.hidden_modules,
            self.suggestion_config.dev_mode,
        )
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Uninitialized => Err(AppError::Precondition(format!(
                "session {} has not been set up",
                self.id
            ))),
        }
    }

    /// Pull the canonical program text, show it and record it.
    async fn resync(&mut self) -> Result<()> {
        let text = self.bridge.current_program_text().await?;
        self.editor.set_cell_text(&text);
        self.history.push(text);
        Ok(())
    }

    /// Create the remote object from `source_text` and take the first
    /// snapshot.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] if the session is already set up.
    /// - [`AppError::Remote`] if the engine rejects the program.
    pub async fn setup(&mut self, source_text: &str) -> Result<()> {
        if self.state == SessionState::Ready {
            return Err(AppError::Precondition(format!(
                "session {} is already set up",
                self.id
            )));
        }
        let _busy = self.busy.acquire();

        self.bridge.setup(source_text).await?;
        self.resync().await?;
        self.state = SessionState::Ready;
        info!(session_id = self.id, object = self.bridge.object_name(), "session set up");
        Ok(())
    }

    /// Replace the suggestion set with the engine's current candidates,
    /// minus those already accepted as targets.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure; the previous
    /// suggestions are kept.
    pub async fn refresh_suggestions(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let _busy = self.busy.acquire();

        let offered = self.bridge.list_suggestions().await?;
        self.suggestions = without_targets(offered, &self.targets);
        debug!(session_id = self.id, count = self.suggestions.len(), "suggestions refreshed");
        Ok(())
    }

    /// Undo the most recent program mutation.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] when only the setup snapshot exists.
    /// - [`AppError::Remote`] if the engine's undo fails.
    pub async fn undo(&mut self) -> Result<()> {
        self.ensure_ready()?;
        if !self.history.can_undo() {
            return Err(AppError::Precondition("nothing to undo".into()));
        }
        let _busy = self.busy.acquire();

        self.bridge.undo().await?;
        self.resync().await?;
        self.history.trim_after_undo();
        info!(session_id = self.id, history_len = self.history.len(), "undo applied");
        Ok(())
    }

    /// Apply pass `name` and report whether the program changed.
    ///
    /// A snapshot is appended after every successful call, changed or not.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] for `inline` with no target and no
    ///   pending cursor target; nothing is sent to the engine.
    /// - [`AppError::Remote`] on engine failure or an unparseable verdict.
    pub async fn run_pass(&mut self, name: &str, fixpoint: bool) -> Result<bool> {
        self.ensure_ready()?;
        if name == INLINE_PASS && self.targets.is_empty() && !self.cursor_target_pending {
            return Err(AppError::Precondition(
                "add at least one inline target before running the inline pass".into(),
            ));
        }
        let _busy = self.busy.acquire();

        let changed = self.bridge.run_pass(name, fixpoint).await?;
        self.resync().await?;
        debug!(session_id = self.id, pass = name, fixpoint, changed, "pass applied");
        Ok(changed)
    }

    /// Inline the call under `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] if adding the cursor target or the pass
    /// fails.
    pub async fn inline(&mut self, cursor: CursorPosition) -> Result<bool> {
        self.ensure_ready()?;
        let _busy = self.busy.acquire();

        self.bridge.add_cursor_target(cursor).await?;
        self.cursor_target_pending = true;
        self.run_pass(INLINE_PASS, false).await
    }

    /// Inline the call under the editor's cursor.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] when the editor reports no cursor.
    /// - Anything [`TransformSession::inline`] returns.
    pub async fn inline_at_cursor(&mut self) -> Result<bool> {
        let cursor = self.editor.cursor_position().ok_or_else(|| {
            AppError::Precondition(
                "You must click on the function in the code cell that you want to inline".into(),
            )
        })?;
        self.inline(cursor).await
    }

    /// Optimize to fixpoint, fold unexecuted code and refresh suggestions.
    ///
    /// # Errors
    ///
    /// The first failing step aborts the whole procedure.
    pub async fn optimize(&mut self) -> Result<OptimizeReport> {
        self.ensure_ready()?;
        let _busy = self.busy.acquire();

        let plan = self.plan.clone();
        let report = run_plan(self, &plan).await?;
        self.fold_code().await?;
        self.refresh_suggestions().await?;
        info!(session_id = self.id, history_len = self.history.len(), "optimize finished");
        Ok(report)
    }

    /// Ask the engine which lines never executed and fold them.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn fold_code(&mut self) -> Result<()> {
        self.ensure_ready()?;
        let _busy = self.busy.acquire();

        let lines = self.bridge.fold_ranges().await?;
        self.editor.fold_lines(&lines);
        Ok(())
    }

    /// Engine diagnostic dump.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn debug(&self) -> Result<String> {
        self.ensure_ready()?;
        self.bridge.debug().await
    }

    /// Write the diagnostic dump into a new cell.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`] on engine failure.
    pub async fn debug_to_new_cell(&self) -> Result<()> {
        let dump = self.debug().await?;
        self.editor.create_new_cell(&dump);
        Ok(())
    }

    /// Most recently applied pass, if the engine can tell.
    pub async fn last_pass(&self) -> Option<String> {
        if self.state != SessionState::Ready {
            return None;
        }
        self.bridge.last_pass_name().await
    }

    async fn commit_targets(&mut self, next: Vec<Target>) -> Result<()> {
        self.bridge.sync_targets(&next).await?;
        self.targets = next;
        // The engine's list was replaced wholesale, cursor targets included.
        self.cursor_target_pending = false;
        debug!(session_id = self.id, count = self.targets.len(), "targets synced");
        Ok(())
    }

    /// Accept `target`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] if a target with that name exists.
    /// - [`AppError::Remote`] if the sync fails; targets are left unchanged.
    pub async fn add_target(&mut self, target: Target) -> Result<()> {
        self.ensure_ready()?;
        if self.targets.iter().any(|t| t.name == target.name) {
            return Err(AppError::Precondition(format!(
                "{} is already an inline target",
                target.name
            )));
        }
        let _busy = self.busy.acquire();

        let name = target.name.clone();
        let mut next = self.targets.clone();
        next.push(target);
        self.commit_targets(next).await?;
        self.suggestions.remove(&name);
        info!(session_id = self.id, target_name = name, "target added");
        Ok(())
    }

    /// Move suggestion `name` into the target list.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if `name` is not a current suggestion.
    /// - Anything [`TransformSession::add_target`] returns.
    pub async fn accept_suggestion(&mut self, name: &str) -> Result<()> {
        let meta = self
            .suggestions
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no suggestion named {name}")))?;
        self.add_target(Target::new(name, meta.path, meta.use_site))
            .await
    }

    /// Resolve the editor's selection to an object path and accept it.
    ///
    /// # Errors
    ///
    /// - [`AppError::Precondition`] when nothing is selected.
    /// - [`AppError::NotFound`] when the selection names no importable object.
    /// - Anything [`TransformSession::add_target`] returns.
    pub async fn add_target_from_selection(&mut self) -> Result<Target> {
        self.ensure_ready()?;
        let selection = self
            .editor
            .selected_text()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                AppError::Precondition("select the code naming the object to inline".into())
            })?;
        let _busy = self.busy.acquire();

        let path = self.bridge.resolve_object_path(&selection).await?;
        let target = Target::new(path, selection, "");
        self.add_target(target.clone()).await?;
        Ok(target)
    }

    /// Drop target `name` and refresh suggestions so it can be offered again.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no target has that name.
    /// - [`AppError::Remote`] if the sync or the refresh fails.
    pub async fn remove_target(&mut self, name: &str) -> Result<()> {
        self.ensure_ready()?;
        let _busy = self.busy.acquire();

        let next: Vec<Target> = self
            .targets
            .iter()
            .filter(|t| t.name != name)
            .cloned()
            .collect();
        if next.len() == self.targets.len() {
            return Err(AppError::NotFound(format!("no inline target named {name}")));
        }
        self.commit_targets(next).await?;
        info!(session_id = self.id, target_name = name, "target removed");

        self.refresh_suggestions().await
    }

    /// Move target `name` to position `index` (clamped to the list end).
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if no target has that name.
    /// - [`AppError::Remote`] if the sync fails.
    pub async fn move_target(&mut self, name: &str, index: usize) -> Result<()> {
        self.ensure_ready()?;
        let from = self
            .targets
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| AppError::NotFound(format!("no inline target named {name}")))?;
        let _busy = self.busy.acquire();

        let mut next = self.targets.clone();
        let target = next.remove(from);
        let to = index.min(next.len());
        next.insert(to, target);
        self.commit_targets(next).await
    }

    /// Render `error` for the user, with the last applied pass as context,
    /// and show it in the editor. Returns the rendered text.
    pub async fn report_failure(&self, operation: &str, error: &AppError) -> String {
        let last_pass = self.last_pass().await;
        let detail = match error {
            AppError::Remote { trace, .. } => trace.clone(),
            other => other.to_string(),
        };
        let rendered = format!(
            "Inliner failed during operation: {operation}\n\
             The most recent pass was: {}\n\
             The error was:\n{detail}",
            last_pass.as_deref().unwrap_or("none")
        );
        warn!(session_id = self.id, operation, %error, "operation failed");
        self.editor.show_error(&rendered);
        rendered
    }
}

impl PassRunner for TransformSession {
    fn run_pass<'a>(&'a mut self, name: &'a str, fixpoint: bool) -> PassFuture<'a> {
        Box::pin(TransformSession::run_pass(self, name, fixpoint))
    }
}
