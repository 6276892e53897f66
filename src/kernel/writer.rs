//! Interpreter writer task.
//!
//! Frames outbound [`ExecRequest`]s with [`KernelCodec`] and writes them to
//! the interpreter's stdin.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::codec::Encoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::kernel::codec::KernelCodec;
use crate::kernel::protocol::ExecRequest;
use crate::{AppError, Result};

/// Writer task: forward requests from `msg_rx` to `stdin` as NDJSON.
///
/// Exits cleanly when `cancel` fires or every sender is dropped.
///
/// # Errors
///
/// - [`AppError::Kernel`]`("failed to serialise request …")`.
/// - [`AppError::Kernel`]`("write failed: …")` when the interpreter's stdin
///   is gone.
pub async fn run_writer<W>(
    label: String,
    stdin: W,
    mut msg_rx: mpsc::Receiver<ExecRequest>,
    cancel: CancellationToken,
) -> Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let mut stdin = stdin;
    let mut codec = KernelCodec::new();
    let mut frame = BytesMut::new();

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(label, "kernel writer: cancellation received, stopping");
                break;
            }

            msg = msg_rx.recv() => {
                let Some(request) = msg else {
                    debug!(label, "kernel writer: request channel closed, stopping");
                    break;
                };

                frame.clear();
                codec.encode(&request, &mut frame)?;

                let written = async {
                    stdin.write_all(&frame).await?;
                    stdin.flush().await
                }
                .await;

                if let Err(e) = written {
                    warn!(label, id = request.id, error = %e, "kernel writer: write to stdin failed");
                    return Err(AppError::Kernel(format!("write failed: {e}")));
                }
            }
        }
    }

    Ok(())
}
