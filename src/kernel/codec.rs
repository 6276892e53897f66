//! Line framing for the interpreter's stdio.
//!
//! Inbound, the interpreter's stdout is split into reply lines; blank lines
//! (stray `print()` calls before the driver loop starts) never reach the
//! reader. Outbound, each [`ExecRequest`] becomes one JSON line on stdin.
//! Program texts travel inside reply lines, so the default limit is generous.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::kernel::protocol::ExecRequest;
use crate::{AppError, Result};

/// Default maximum reply line length: 4 MiB.
pub const MAX_LINE_BYTES: usize = 4 * 1_048_576;

/// Codec pairing reply-line decoding with request encoding.
///
/// A reply line longer than the configured limit decodes to
/// [`AppError::Kernel`]`("line too long: …")`. After that error the stream
/// cannot be resynchronised, so readers treat it as fatal.
#[derive(Debug)]
pub struct KernelCodec {
    lines: LinesCodec,
    max_line_bytes: usize,
}

impl KernelCodec {
    /// Codec with the [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_line_bytes(MAX_LINE_BYTES)
    }

    /// Codec rejecting reply lines longer than `max_line_bytes`.
    #[must_use]
    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_line_bytes),
            max_line_bytes,
        }
    }

    /// Configured reply line limit.
    #[must_use]
    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    fn reply_error(&self, err: LinesCodecError) -> AppError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => AppError::Kernel(format!(
                "line too long: reply exceeded {} bytes",
                self.max_line_bytes
            )),
            LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
        }
    }

    fn next_line(
        &mut self,
        src: &mut BytesMut,
        at_eof: bool,
    ) -> std::result::Result<Option<String>, LinesCodecError> {
        loop {
            let line = if at_eof {
                self.lines.decode_eof(src)?
            } else {
                self.lines.decode(src)?
            };
            match line {
                Some(line) if line.trim().is_empty() => {}
                other => return Ok(other),
            }
        }
    }
}

impl Default for KernelCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for KernelCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        self.next_line(src, false).map_err(|e| self.reply_error(e))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        self.next_line(src, true).map_err(|e| self.reply_error(e))
    }
}

impl Encoder<&ExecRequest> for KernelCodec {
    type Error = AppError;

    fn encode(&mut self, request: &ExecRequest, dst: &mut BytesMut) -> Result<()> {
        serde_json::to_writer(BufMut::writer(&mut *dst), request).map_err(|e| {
            AppError::Kernel(format!("failed to serialise request {}: {e}", request.id))
        })?;
        dst.put_u8(b'\n');
        Ok(())
    }
}
