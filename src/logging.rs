//! Tracing subscriber setup for hosts embedding the orchestrator.

use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// The filter is read from `RUST_LOG` and falls back to `info`. Returns
/// `false` when a global subscriber was already installed, which makes the
/// call safe to repeat.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
