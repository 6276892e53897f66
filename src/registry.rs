//! Session registry: every live transform session, keyed by editing target.
//!
//! The registry owns the execution environment handle and hands it to each
//! session it creates, along with the one busy indicator all sessions share.
//! Bookkeeping only; it never talks to the environment itself.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::bridge::CommandBridge;
use crate::config::GlobalConfig;
use crate::editor::Editor;
use crate::kernel::ExecutionEnvironment;
use crate::session::busy::BusyIndicator;
use crate::session::TransformSession;
use crate::Result;

/// All transform sessions of one host session.
pub struct SessionRegistry {
    env: Arc<dyn ExecutionEnvironment>,
    config: Arc<GlobalConfig>,
    sessions: HashMap<String, TransformSession>,
    current: Option<String>,
    busy: BusyIndicator,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .field("busy", &self.busy.is_busy())
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Create an empty registry over `env`.
    #[must_use]
    pub fn new(env: Arc<dyn ExecutionEnvironment>, config: Arc<GlobalConfig>) -> Self {
        Self {
            env,
            config,
            sessions: HashMap::new(),
            current: None,
            busy: BusyIndicator::new(),
        }
    }

    /// Shared busy indicator.
    #[must_use]
    pub fn busy(&self) -> &BusyIndicator {
        &self.busy
    }

    /// Configuration sessions are created with.
    #[must_use]
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Build an uninitialized session for `id` driving its own uniquely
    /// named remote object. The registry is not touched.
    fn build_session(&self, id: String, editor: Arc<dyn Editor>) -> Result<TransformSession> {
        let suffix = Uuid::new_v4().simple().to_string();
        let object = format!("{}_{}", self.config.kernel.object_prefix, &suffix[..8]);
        let bridge = CommandBridge::new(object, Arc::clone(&self.env))?;
        Ok(TransformSession::new(
            id,
            bridge,
            editor,
            self.busy.clone(),
            &self.config,
        ))
    }

    /// Register `session`, replacing any entry with the same id, and make it
    /// current.
    fn install(&mut self, session: TransformSession) -> &mut TransformSession {
        let id = session.id().to_owned();
        info!(session_id = id, "session registered");
        self.current = Some(id.clone());
        match self.sessions.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.insert(session);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(session),
        }
    }

    /// Build an uninitialized session for `id`, register it and make it
    /// current. The session drives its own uniquely named remote object.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`](crate::AppError::Config) if the configured
    /// object prefix yields an invalid name.
    pub fn create_session(
        &mut self,
        id: impl Into<String>,
        editor: Arc<dyn Editor>,
    ) -> Result<&mut TransformSession> {
        let session = self.build_session(id.into(), editor)?;
        Ok(self.install(session))
    }

    /// Create a session for `id`, set it up from `source_text`, and load its
    /// first suggestions.
    ///
    /// The new session is registered only once setup succeeds; until then any
    /// session already open for `id`, and the current id, stay untouched. If
    /// only the suggestion refresh fails the session stays registered and the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Propagates setup and refresh failures.
    pub async fn open_session(
        &mut self,
        id: impl Into<String>,
        editor: Arc<dyn Editor>,
        source_text: &str,
    ) -> Result<()> {
        let id = id.into();
        let mut session = self.build_session(id.clone(), editor)?;
        if let Err(err) = session.setup(source_text).await {
            warn!(session_id = id, %err, "setup failed, discarding new session");
            return Err(err);
        }

        self.install(session).refresh_suggestions().await
    }

    /// Insert `session` under its identifier, replacing any previous one.
    pub fn add_session(&mut self, session: TransformSession) -> Option<TransformSession> {
        let id = session.id().to_owned();
        info!(session_id = id, "session registered");
        self.sessions.insert(id, session)
    }

    /// Remove and return the session for `id`.
    pub fn remove_session(&mut self, id: &str) -> Option<TransformSession> {
        let removed = self.sessions.remove(id);
        if removed.is_some() {
            info!(session_id = id, "session removed");
        }
        removed
    }

    /// Point "current" at `id`; the session need not exist yet.
    pub fn set_current(&mut self, id: impl Into<String>) {
        self.current = Some(id.into());
    }

    /// Forget the current identifier.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// Current identifier, if any.
    #[must_use]
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Session for the current identifier, if both exist.
    #[must_use]
    pub fn current_session(&self) -> Option<&TransformSession> {
        self.current.as_ref().and_then(|id| self.sessions.get(id))
    }

    /// Mutable access to the current session.
    pub fn current_session_mut(&mut self) -> Option<&mut TransformSession> {
        let id = self.current.as_ref()?;
        self.sessions.get_mut(id)
    }

    /// Session for `id`.
    #[must_use]
    pub fn session(&self, id: &str) -> Option<&TransformSession> {
        self.sessions.get(id)
    }

    /// Mutable session for `id`.
    pub fn session_mut(&mut self, id: &str) -> Option<&mut TransformSession> {
        self.sessions.get_mut(id)
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn session_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
