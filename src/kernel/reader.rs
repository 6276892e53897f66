//! Interpreter reader task.
//!
//! Reads NDJSON reply lines from the interpreter's stdout through
//! [`KernelCodec`] and routes each [`ExecReply`] to the caller waiting on its
//! id in the shared [`ReplyTable`].

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::{oneshot, Mutex};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::kernel::codec::KernelCodec;
use crate::kernel::protocol::{parse_reply_line, ExecReply};
use crate::{AppError, Result};

/// Callers waiting for replies, keyed by request id.
///
/// Once closed, every waiter has been dropped and new registrations fail, so
/// no request can wait on a stream that will never answer.
#[derive(Debug, Default)]
pub struct ReplyTable {
    closed: Option<String>,
    waiters: HashMap<u64, oneshot::Sender<ExecReply>>,
}

/// Shared handle to the [`ReplyTable`].
pub type PendingReplies = Arc<Mutex<ReplyTable>>;

impl ReplyTable {
    /// Register a waiter for request `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Kernel`] if the reply stream is already closed.
    pub fn register(&mut self, id: u64) -> Result<oneshot::Receiver<ExecReply>> {
        if let Some(reason) = &self.closed {
            return Err(AppError::Kernel(format!("interpreter unavailable: {reason}")));
        }
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id, tx);
        Ok(rx)
    }

    /// Forget a waiter whose request could not be sent.
    pub fn cancel(&mut self, id: u64) {
        self.waiters.remove(&id);
    }

    /// Deliver `reply` to its waiter. Returns `false` for unknown ids.
    pub fn resolve(&mut self, reply: ExecReply) -> bool {
        match self.waiters.remove(&reply.id) {
            Some(tx) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// Close the table, failing every outstanding waiter.
    pub fn close(&mut self, reason: &str) {
        if self.closed.is_none() {
            self.closed = Some(reason.to_owned());
        }
        self.waiters.clear();
    }

    /// Reason the table was closed, if it was.
    #[must_use]
    pub fn closed_reason(&self) -> Option<&str> {
        self.closed.as_deref()
    }

    /// Number of requests still waiting.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.waiters.len()
    }
}

/// Reader task: decode reply lines from `stdout` and resolve waiters.
///
/// Unparseable lines are logged and skipped. A framing error (a reply over
/// the line limit) leaves the stream unusable, so it ends the task like EOF,
/// an I/O error or cancellation: the [`ReplyTable`] is closed with the
/// reason and every waiting caller fails.
///
/// # Errors
///
/// Always returns `Ok(())`; failures are reported through the table.
pub async fn run_reader<R>(
    label: String,
    stdout: R,
    pending: PendingReplies,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(stdout, KernelCodec::new());

    let reason = loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!(label, "kernel reader: cancellation received, stopping");
                break "kernel shut down".to_owned();
            }

            item = framed.next() => {
                match item {
                    None => {
                        debug!(label, "kernel reader: EOF detected");
                        break "stream closed".to_owned();
                    }

                    Some(Err(AppError::Kernel(msg))) => {
                        warn!(label, error = msg.as_str(), "kernel reader: framing error, closing stream");
                        break format!("framing error: {msg}");
                    }

                    Some(Err(e)) => {
                        warn!(label, error = %e, "kernel reader: IO error, stopping");
                        break format!("stream error: {e}");
                    }

                    Some(Ok(line)) => match parse_reply_line(&line) {
                        Ok(Some(reply)) => {
                            let id = reply.id;
                            if !pending.lock().await.resolve(reply) {
                                debug!(label, id, "kernel reader: reply for unknown request");
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            warn!(label, error = %e, raw_line = %line, "kernel reader: parse error, skipping line");
                        }
                    },
                }
            }
        }
    };

    pending.lock().await.close(&reason);
    Ok(())
}
