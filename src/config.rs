//! Global configuration parsing and validation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::kernel::bootstrap::BOOTSTRAP_SOURCE;
use crate::logging::LogFormat;
use crate::{AppError, Result};

/// Interpreter process settings used by [`ProcessKernel`](crate::kernel::process::ProcessKernel).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct KernelConfig {
    /// Interpreter binary (e.g. `python3`, `/opt/venv/bin/python`).
    #[serde(default = "default_kernel_command")]
    pub command: String,
    /// Arguments passed to the interpreter; defaults to running the embedded
    /// NDJSON driver loop.
    #[serde(default = "default_kernel_args")]
    pub args: Vec<String>,
    /// Maximum time to wait for the interpreter's ready line.
    #[serde(default = "default_startup_timeout_seconds")]
    pub startup_timeout_seconds: u64,
    /// Prefix for the per-session remote object names.
    #[serde(default = "default_object_prefix")]
    pub object_prefix: String,
    /// Extra environment variables set on the interpreter process.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_kernel_command() -> String {
    "python3".into()
}

fn default_kernel_args() -> Vec<String> {
    vec!["-u".into(), "-c".into(), BOOTSTRAP_SOURCE.into()]
}

fn default_startup_timeout_seconds() -> u64 {
    30
}

fn default_object_prefix() -> String {
    "inliner".into()
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            command: default_kernel_command(),
            args: default_kernel_args(),
            startup_timeout_seconds: default_startup_timeout_seconds(),
            object_prefix: default_object_prefix(),
            env: HashMap::new(),
        }
    }
}

impl KernelConfig {
    /// Startup handshake window as a [`Duration`].
    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_seconds)
    }
}

/// Pass schedule used by the optimize procedure.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct OptimizeConfig {
    /// Passes applied in order during one fixpoint round.
    #[serde(default = "default_passes")]
    pub passes: Vec<String>,
    /// Passes the engine repeats to local convergence before reporting.
    #[serde(default = "default_fixpoint_passes")]
    pub fixpoint_passes: Vec<String>,
    /// One-shot pass run between the two fixpoint phases.
    #[serde(default = "default_intermediate_pass")]
    pub intermediate_pass: String,
    /// One-shot pass run after the second fixpoint phase.
    #[serde(default = "default_final_pass")]
    pub final_pass: String,
    /// Upper bound on rounds per fixpoint phase; unbounded when absent.
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

fn default_passes() -> Vec<String> {
    [
        "inline",
        "dead_code",
        "copy_propagation",
        "unused_vars",
        "clean_imports",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_fixpoint_passes() -> Vec<String> {
    vec!["dead_code".into()]
}

fn default_intermediate_pass() -> String {
    "record_to_vars".into()
}

fn default_final_pass() -> String {
    "remove_suffixes".into()
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            passes: default_passes(),
            fixpoint_passes: default_fixpoint_passes(),
            intermediate_pass: default_intermediate_pass(),
            final_pass: default_final_pass(),
            max_rounds: None,
        }
    }
}

/// Suggestion display settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SuggestionConfig {
    /// Top-level modules whose candidates are hidden outside developer mode.
    #[serde(default = "default_hidden_modules")]
    pub hidden_modules: Vec<String>,
    /// Show every candidate, including hidden modules.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_hidden_modules() -> Vec<String> {
    vec!["matplotlib".into(), "pandas".into(), "numpy".into()]
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            hidden_modules: default_hidden_modules(),
            dev_mode: false,
        }
    }
}

/// Global configuration parsed from `inliner.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interpreter process settings.
    #[serde(default)]
    pub kernel: KernelConfig,
    /// Optimize schedule.
    #[serde(default)]
    pub optimize: OptimizeConfig,
    /// Suggestion display settings.
    #[serde(default)]
    pub suggestions: SuggestionConfig,
    /// Log output format for hosts that call [`crate::logging::init_tracing`].
    #[serde(default)]
    pub log_format: LogFormat,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.kernel.command.trim().is_empty() {
            return Err(AppError::Config("kernel.command must not be empty".into()));
        }

        if self.kernel.startup_timeout_seconds == 0 {
            return Err(AppError::Config(
                "kernel.startup_timeout_seconds must be greater than zero".into(),
            ));
        }

        if !is_identifier(&self.kernel.object_prefix) {
            return Err(AppError::Config(format!(
                "kernel.object_prefix must be a python identifier, got {:?}",
                self.kernel.object_prefix
            )));
        }

        if self.optimize.passes.is_empty() {
            return Err(AppError::Config(
                "optimize.passes must not be empty".into(),
            ));
        }

        let all_passes = self
            .optimize
            .passes
            .iter()
            .chain(&self.optimize.fixpoint_passes)
            .chain([&self.optimize.intermediate_pass, &self.optimize.final_pass]);
        for pass in all_passes {
            if !is_identifier(pass) {
                return Err(AppError::Config(format!("invalid pass name: {pass:?}")));
            }
        }

        if self.optimize.max_rounds == Some(0) {
            return Err(AppError::Config(
                "optimize.max_rounds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// ASCII identifier check used for pass names and object prefixes, which are
/// spliced into interpreter commands.
pub(crate) fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
