//! Interpreter process spawner.
//!
//! Launches the configured interpreter with:
//! - `kill_on_drop(true)` so the process dies with its handle.
//! - `env_clear()` plus an allowlist, so host secrets never reach code the
//!   inliner executes.
//! - A startup timeout: the first stdout line must be the `{"ready": true}`
//!   handshake, otherwise the process is killed.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::config::KernelConfig;
use crate::kernel::protocol::is_ready_line;
use crate::{AppError, Result};

/// Environment variables inherited by the interpreter process.
pub const ALLOWED_ENV_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "LANG",
    "LC_ALL",
    "TMPDIR",
    "PYTHONPATH",
    "PYTHONHOME",
    "VIRTUAL_ENV",
    "CONDA_PREFIX",
    // Windows-specific variables.
    "USERPROFILE",
    "SystemRoot",
    "TEMP",
    "TMP",
    "APPDATA",
    "LOCALAPPDATA",
];

/// Live stdio connection to a spawned interpreter.
#[derive(Debug)]
pub struct KernelConnection {
    /// Child process handle; kept alive so `kill_on_drop` works.
    pub child: Child,
    /// Interpreter stdin for requests.
    pub stdin: ChildStdin,
    /// Buffered interpreter stdout, positioned after the ready line.
    pub stdout: BufReader<ChildStdout>,
}

/// Spawn the interpreter and wait for its ready line.
///
/// # Errors
///
/// - `AppError::Kernel("failed to spawn interpreter: …")` on OS spawn failure.
/// - `AppError::Kernel("startup timeout …")` when no line arrives in time.
/// - `AppError::Kernel("interpreter exited before ready signal")` on early EOF.
/// - `AppError::Kernel("unexpected ready line: …")` when the first line is not
///   the handshake.
pub async fn spawn_kernel(config: &KernelConfig) -> Result<KernelConnection> {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args);

    cmd.env_clear();
    for &key in ALLOWED_ENV_VARS {
        if let Ok(val) = std::env::var(key) {
            cmd.env(key, val);
        }
    }
    cmd.envs(&config.env);

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|err| AppError::Kernel(format!("failed to spawn interpreter: {err}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AppError::Kernel("failed to capture interpreter stdin".into()))?;
    let stdout_raw = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Kernel("failed to capture interpreter stdout".into()))?;
    if let Some(stderr) = child.stderr.take() {
        forward_stderr(stderr);
    }

    let mut reader = BufReader::new(stdout_raw);
    let mut line = String::new();

    match tokio::time::timeout(config.startup_timeout(), reader.read_line(&mut line)).await {
        Ok(Ok(n)) if n > 0 => {
            if !is_ready_line(&line) {
                child.kill().await.ok();
                return Err(AppError::Kernel(format!(
                    "unexpected ready line: {}",
                    line.trim()
                )));
            }
            info!(command = config.command.as_str(), "interpreter emitted ready signal");
        }
        Ok(Ok(_)) => {
            return Err(AppError::Kernel(
                "interpreter exited before ready signal".into(),
            ));
        }
        Ok(Err(err)) => {
            return Err(AppError::Kernel(format!(
                "failed to read interpreter ready signal: {err}"
            )));
        }
        Err(_elapsed) => {
            child.kill().await.ok();
            return Err(AppError::Kernel(format!(
                "startup timeout: interpreter did not emit ready signal within {:?}",
                config.startup_timeout()
            )));
        }
    }

    Ok(KernelConnection {
        child,
        stdin,
        stdout: reader,
    })
}

/// Drain the interpreter's stderr into the log so the pipe never fills.
fn forward_stderr(stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "inliner_session::kernel::stderr", "{line}");
        }
    });
}
