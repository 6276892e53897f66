//! Wire types for the interpreter NDJSON protocol.
//!
//! | Direction | Shape                                                       |
//! |-----------|-------------------------------------------------------------|
//! | out       | `{"id": 7, "code": "...", "capture": true}`                 |
//! | in        | `{"ready": true}` (first line only)                         |
//! | in        | `{"id": 7, "status": "ok", "output": "..."}`                |
//! | in        | `{"id": 7, "status": "error", "traceback": ["...", "..."]}` |

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AppError, Result};

/// One command sent to the interpreter.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExecRequest {
    /// Correlation id echoed back in the reply.
    pub id: u64,
    /// Python source to execute.
    pub code: String,
    /// Whether captured stdout should be returned.
    pub capture: bool,
}

/// Outcome carried by a reply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecOutcome {
    /// The command completed.
    Ok {
        /// Captured stdout; empty when capture was not requested.
        #[serde(default)]
        output: String,
    },
    /// The command raised.
    Error {
        /// Trace lines as produced by the interpreter.
        #[serde(default)]
        traceback: Vec<String>,
    },
}

/// One reply received from the interpreter.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ExecReply {
    /// Correlation id of the request this answers.
    pub id: u64,
    /// Result of the command.
    #[serde(flatten)]
    pub outcome: ExecOutcome,
}

#[derive(Debug, Deserialize)]
struct ReadyLine {
    ready: bool,
}

/// Parse one inbound line.
///
/// - `Ok(Some(reply))` for a well-formed reply.
/// - `Ok(None)` for blank lines and JSON objects that are not replies.
///
/// # Errors
///
/// - [`AppError::Kernel`]`("malformed json: …")` when the line is not JSON.
/// - [`AppError::Kernel`]`("malformed reply: …")` when a line with an `id`
///   does not match the reply shape.
pub fn parse_reply_line(line: &str) -> Result<Option<ExecReply>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let value: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| AppError::Kernel(format!("malformed json: {e}")))?;

    if value.get("id").is_none() {
        debug!(raw_line = line, "kernel: skipping non-reply line");
        return Ok(None);
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| AppError::Kernel(format!("malformed reply: {e}")))
}

/// Whether `line` is the interpreter's `{"ready": true}` handshake.
#[must_use]
pub fn is_ready_line(line: &str) -> bool {
    serde_json::from_str::<ReadyLine>(line.trim()).is_ok_and(|r| r.ready)
}
