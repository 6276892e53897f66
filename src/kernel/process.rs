//! [`ExecutionEnvironment`] backed by a child interpreter process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::process::Child;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::KernelConfig;
use crate::kernel::protocol::{ExecOutcome, ExecRequest};
use crate::kernel::reader::{run_reader, PendingReplies, ReplyTable};
use crate::kernel::spawner::spawn_kernel;
use crate::kernel::writer::run_writer;
use crate::kernel::{format_trace, ExecFuture, ExecutionEnvironment};
use crate::{AppError, Result};

/// Capacity of the outbound request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 32;

/// Persistent interpreter process speaking the NDJSON exec protocol.
///
/// Owns a reader task and a writer task over the child's stdio. Requests are
/// numbered; the reader routes each reply to the waiting caller.
#[derive(Debug)]
pub struct ProcessKernel {
    label: String,
    request_tx: mpsc::Sender<ExecRequest>,
    pending: PendingReplies,
    next_id: AtomicU64,
    cancel: CancellationToken,
    child: Mutex<Option<Child>>,
}

impl ProcessKernel {
    /// Spawn the configured interpreter and start its stdio tasks.
    ///
    /// # Errors
    ///
    /// Propagates [`spawn_kernel`] failures.
    pub async fn start(config: &KernelConfig) -> Result<Self> {
        let connection = spawn_kernel(config).await?;
        let label = config.command.clone();
        let cancel = CancellationToken::new();
        let pending: PendingReplies = Arc::new(Mutex::new(ReplyTable::default()));
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);

        tokio::spawn(run_reader(
            label.clone(),
            connection.stdout,
            Arc::clone(&pending),
            cancel.clone(),
        ));

        let writer_label = label.clone();
        let writer_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) =
                run_writer(writer_label.clone(), connection.stdin, request_rx, writer_cancel).await
            {
                warn!(label = writer_label, %err, "kernel writer stopped");
            }
        });

        info!(label, "interpreter kernel started");
        Ok(Self {
            label,
            request_tx,
            pending,
            next_id: AtomicU64::new(1),
            cancel,
            child: Mutex::new(Some(connection.child)),
        })
    }

    /// Stop the stdio tasks and kill the interpreter. Idempotent.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(err) = child.kill().await {
                debug!(label = self.label, %err, "interpreter already exited");
            }
        }
        info!(label = self.label, "interpreter kernel shut down");
    }

    async fn round_trip(&self, source: &str, capture_output: bool) -> Result<Option<String>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let reply_rx = self.pending.lock().await.register(id)?;

        let request = ExecRequest {
            id,
            code: source.trim().to_owned(),
            capture: capture_output,
        };
        if self.request_tx.send(request).await.is_err() {
            self.pending.lock().await.cancel(id);
            return Err(AppError::Kernel("interpreter writer is not running".into()));
        }

        let reply = reply_rx.await.map_err(|_| {
            AppError::Kernel(format!("interpreter closed before answering request {id}"))
        })?;

        match reply.outcome {
            ExecOutcome::Ok { output } => Ok(capture_output.then_some(output)),
            ExecOutcome::Error { traceback } => {
                Err(AppError::remote("execute", format_trace(&traceback)))
            }
        }
    }
}

impl ExecutionEnvironment for ProcessKernel {
    fn execute<'a>(&'a self, source: &'a str, capture_output: bool) -> ExecFuture<'a> {
        Box::pin(self.round_trip(source, capture_output))
    }
}
