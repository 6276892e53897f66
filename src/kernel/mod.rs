//! Execution environment abstraction and the interpreter-process backend.
//!
//! The orchestrator never evaluates anything itself. Every intent is turned
//! into Python source by the [`bridge`](crate::bridge) and handed to an
//! [`ExecutionEnvironment`], which runs it inside a persistent interpreter
//! holding the live program object.
//!
//! Submodules:
//! - `codec`: line framing for the interpreter's NDJSON stdout.
//! - `protocol`: request/reply wire types.
//! - `reader` / `writer`: stdio tasks backing [`process::ProcessKernel`].
//! - `spawner`: interpreter process launch and ready handshake.
//! - `bootstrap`: the driver loop executed by the default interpreter command.

pub mod bootstrap;
pub mod codec;
pub mod process;
pub mod protocol;
pub mod reader;
pub mod spawner;
pub mod writer;

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use regex::Regex;

use crate::Result;

/// Boxed future returned by [`ExecutionEnvironment::execute`].
pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + 'a>>;

/// A persistent interpreter session that runs short textual commands.
///
/// Implementations exist per host: [`process::ProcessKernel`] drives a child
/// interpreter over stdio; notebook hosts route commands to their kernel.
pub trait ExecutionEnvironment: Send + Sync {
    /// Execute `source` in the interpreter's global namespace.
    ///
    /// With `capture_output` the captured stdout is returned as
    /// `Ok(Some(text))`; otherwise the call resolves to `Ok(None)` once the
    /// interpreter acknowledges completion.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Remote`](crate::AppError::Remote) when the
    /// interpreter raised, with the trace already passed through
    /// [`format_trace`]. Transport failures are
    /// [`AppError::Kernel`](crate::AppError::Kernel).
    fn execute<'a>(&'a self, source: &'a str, capture_output: bool) -> ExecFuture<'a>;
}

/// Join trace lines and strip ANSI colour/styling escape sequences.
#[must_use]
pub fn format_trace(lines: &[String]) -> String {
    let joined = lines.join("\n");
    match ansi_pattern() {
        Some(pattern) => pattern.replace_all(&joined, "").into_owned(),
        None => joined,
    }
}

fn ansi_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"[\x1b\x{9b}][\[()#;?]*(?:[0-9]{1,4}(?:;[0-9]{0,4})*)?[0-9A-ORZcf-nqry=><]")
                .ok()
        })
        .as_ref()
}
