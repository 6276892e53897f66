//! Error types shared across the crate.

use std::fmt::{Display, Formatter};

/// Shared crate result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error enumeration covering every failure mode of the session orchestrator.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// The session lacks the state an operation needs; nothing was sent to
    /// the execution environment.
    Precondition(String),
    /// The execution environment reported a failure or returned a reply that
    /// could not be parsed.
    Remote {
        /// Bridge operation that was attempted (e.g. `run_pass:inline`).
        operation: String,
        /// Colour-stripped trace or raw output returned by the environment.
        trace: String,
    },
    /// A pass schedule kept reporting changes past its configured round limit.
    Convergence(String),
    /// Transport failure talking to the interpreter process.
    Kernel(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Build a [`AppError::Remote`] for `operation`.
    #[must_use]
    pub fn remote(operation: impl Into<String>, trace: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            trace: trace.into(),
        }
    }

    /// Re-label a remote failure with the bridge operation that caused it.
    ///
    /// Other variants are returned untouched.
    #[must_use]
    pub fn with_operation(self, operation: &str) -> Self {
        match self {
            Self::Remote { trace, .. } => Self::Remote {
                operation: operation.to_owned(),
                trace,
            },
            other => other,
        }
    }

    /// Whether this is a local precondition failure.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Precondition(msg) => write!(f, "precondition: {msg}"),
            Self::Remote { operation, trace } => write!(f, "remote: {operation}: {trace}"),
            Self::Convergence(msg) => write!(f, "convergence: {msg}"),
            Self::Kernel(msg) => write!(f, "kernel: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
