//! Executes a stream plan: spawns at most one processing child (or none for
//! a direct proxy), forwards its bytes in order, and releases every resource
//! on every exit path.
//!
//! The runner owns the child process exclusively. Nothing it allocates
//! (child, pipe, temp files, registry entry) outlives the operation; the
//! single `cleanup` routine runs after completion, timeout, failure and
//! cancellation alike.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::Client;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use sluice_plan::{PlanKind, StreamPlan};

use crate::error::StreamError;
use crate::ffmpeg::{self, InputSource};
use crate::http::header_map;
use crate::proxy;
use crate::registry::OperationRegistry;
use crate::tempfile::TempFileManager;

/// Ordered byte channel from the operation to its single consumer.
pub type ByteSink = mpsc::Sender<Result<Bytes, StreamError>>;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub ffmpeg_binary: String,
    /// Absolute lifetime of one operation, from start of execution.
    pub deadline: Duration,
    /// How long a signalled child gets before the forced kill.
    pub kill_grace: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: "ffmpeg".to_string(),
            deadline: Duration::from_secs(90),
            kill_grace: Duration::from_secs(5),
        }
    }
}

/// What the consumer needs to know before the first byte arrives.
#[derive(Debug, Clone)]
pub struct StartInfo {
    pub operation_id: Uuid,
    pub status: u16,
    pub content_type: Option<String>,
    /// Exact length, known only on the direct-proxy path.
    pub content_length: Option<u64>,
    /// Advisory estimate (`source length x size multiplier`), never exact.
    pub estimated_length: Option<u64>,
    /// Whether the consumer may issue Range requests against this stream.
    pub accept_ranges: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
    TimedOut,
    Failed(StreamError),
}

/// A live operation as seen by its consumer. Dropping the handle cancels the
/// operation and triggers cleanup.
#[derive(Debug)]
pub struct StreamHandle {
    pub info: StartInfo,
    pub receiver: mpsc::Receiver<Result<Bytes, StreamError>>,
    _cancel_on_drop: DropGuard,
}

impl StreamHandle {
    /// Turn the handle into a plain byte stream. Dropping the stream still
    /// cancels the operation.
    pub fn into_stream(self) -> ByteStream {
        ByteStream {
            receiver: self.receiver,
            _cancel_on_drop: self._cancel_on_drop,
        }
    }
}

pub struct ByteStream {
    receiver: mpsc::Receiver<Result<Bytes, StreamError>>,
    _cancel_on_drop: DropGuard,
}

impl futures::Stream for ByteStream {
    type Item = Result<Bytes, StreamError>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

pub struct ProcessRunner {
    config: RunnerConfig,
    client: Client,
    temp: Arc<TempFileManager>,
    registry: Arc<OperationRegistry>,
}

fn kind_label(kind: &PlanKind) -> &'static str {
    match kind {
        PlanKind::DirectProxy => "direct-proxy",
        PlanKind::Remux { .. } => "remux",
        PlanKind::MergeTracks { .. } => "merge",
        PlanKind::TranscodeAudio => "audio",
        PlanKind::TranscodeGif => "gif",
        PlanKind::EnhanceVideo => "enhance",
        PlanKind::Redirect { .. } => "redirect",
        PlanKind::Picker { .. } => "picker",
        PlanKind::LocalProcessing { .. } => "local-processing",
        PlanKind::Error { .. } => "error",
    }
}

impl ProcessRunner {
    pub fn new(
        client: Client,
        config: RunnerConfig,
        temp: Arc<TempFileManager>,
        registry: Arc<OperationRegistry>,
    ) -> Self {
        Self {
            config,
            client,
            temp,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// Reject plans that can never be executed, before anything is spawned
    /// or registered.
    pub fn validate(plan: &StreamPlan) -> Result<(), StreamError> {
        match &plan.kind {
            PlanKind::Redirect { .. } | PlanKind::Picker { .. } | PlanKind::Error { .. } => Err(
                StreamError::invalid_plan("plan is answered inline, not streamed"),
            ),
            PlanKind::LocalProcessing { .. } => Err(StreamError::invalid_plan(
                "local processing tunnels each input as its own direct proxy",
            )),
            PlanKind::MergeTracks { .. } if plan.inputs.len() != 2 => {
                Err(StreamError::invalid_plan("merge requires exactly two inputs"))
            }
            PlanKind::MergeTracks { .. } => Ok(()),
            _ if plan.inputs.len() != 1 => {
                Err(StreamError::invalid_plan("plan requires exactly one input"))
            }
            _ => Ok(()),
        }
    }

    /// Run the plan to a terminal outcome, delivering `StartInfo` through
    /// `started` and bytes through `sink`.
    pub async fn execute(
        &self,
        plan: &StreamPlan,
        range: Option<&str>,
        started: oneshot::Sender<StartInfo>,
        sink: ByteSink,
        cancel: CancellationToken,
    ) -> StreamOutcome {
        if let Err(err) = Self::validate(plan) {
            let _ = sink.try_send(Err(err.clone()));
            return StreamOutcome::Failed(err);
        }

        let operation = self.registry.register(kind_label(&plan.kind));
        debug!(%operation, kind = kind_label(&plan.kind), "operation started");

        let mut temp_paths: Vec<PathBuf> = Vec::new();
        let result = self
            .run(plan, operation, range, started, &sink, &cancel, &mut temp_paths)
            .await;
        self.cleanup(&operation, &temp_paths).await;

        match result {
            Ok(()) => {
                info!(%operation, "stream completed");
                StreamOutcome::Completed
            }
            Err(StreamError::Cancelled) | Err(StreamError::ClientGone) => {
                debug!(%operation, "stream cancelled");
                StreamOutcome::Cancelled
            }
            Err(StreamError::DeadlineExceeded) => {
                warn!(%operation, "stream deadline exceeded");
                let _ = sink.try_send(Err(StreamError::DeadlineExceeded));
                StreamOutcome::TimedOut
            }
            Err(err) => {
                error!(%operation, error = %err, "stream failed");
                let _ = sink.try_send(Err(err.clone()));
                StreamOutcome::Failed(err)
            }
        }
    }

    /// Spawn the operation on its own task and wait for it to start.
    ///
    /// A start failure is returned as the concrete error; once a handle is
    /// returned, further failures arrive through its byte channel.
    pub async fn open(
        self: &Arc<Self>,
        plan: StreamPlan,
        range: Option<String>,
    ) -> Result<StreamHandle, StreamError> {
        let (info_tx, info_rx) = oneshot::channel();
        let (byte_tx, mut byte_rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();

        let runner = Arc::clone(self);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            runner
                .execute(&plan, range.as_deref(), info_tx, byte_tx, task_cancel)
                .await;
        });

        // Armed before the wait: a caller dropped while the origin hangs
        // still cancels the spawned operation.
        let guard = cancel.drop_guard();

        match info_rx.await {
            Ok(info) => Ok(StreamHandle {
                info,
                receiver: byte_rx,
                _cancel_on_drop: guard,
            }),
            Err(_) => {
                drop(guard);
                match byte_rx.recv().await {
                    Some(Err(err)) => Err(err),
                    _ => Err(StreamError::Cancelled),
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run(
        &self,
        plan: &StreamPlan,
        operation: Uuid,
        range: Option<&str>,
        started: oneshot::Sender<StartInfo>,
        sink: &ByteSink,
        cancel: &CancellationToken,
        temp_paths: &mut Vec<PathBuf>,
    ) -> Result<(), StreamError> {
        let deadline = Instant::now() + self.config.deadline;
        let mut inputs: Vec<InputSource> = plan.inputs.iter().map(InputSource::from).collect();

        if matches!(plan.kind, PlanKind::DirectProxy) {
            let response = bounded(
                deadline,
                cancel,
                proxy::open_upstream(&self.client, &inputs[0], range),
            )
            .await?;
            let info = StartInfo {
                operation_id: operation,
                status: response.status().as_u16(),
                content_type: response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned),
                content_length: response.content_length(),
                estimated_length: None,
                accept_ranges: proxy::supports_ranges(&response),
            };
            let _ = started.send(info);
            return proxy::forward(response, deadline, sink, cancel).await;
        }

        if plan.prefetch {
            bounded(deadline, cancel, async {
                self.prefetch_inputs(&mut inputs, temp_paths).await;
                Ok(())
            })
            .await?;
        }

        let estimated_length = bounded(deadline, cancel, async {
            Ok(self.estimate_length(plan, &inputs).await)
        })
        .await?;
        let args = ffmpeg::build_args(plan, &inputs)?;

        let _ = started.send(StartInfo {
            operation_id: operation,
            status: 200,
            content_type: plan.output.map(|o| o.container.mime().to_string()),
            content_length: None,
            estimated_length,
            accept_ranges: false,
        });

        let mut command = Command::new(&self.config.ffmpeg_binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        stream_child(
            command,
            &self.config.ffmpeg_binary,
            deadline,
            self.config.kill_grace,
            sink,
            cancel,
        )
        .await
    }

    /// Materialize each input locally. A failed download falls back to
    /// streaming that input straight from the origin.
    async fn prefetch_inputs(&self, inputs: &mut [InputSource], temp_paths: &mut Vec<PathBuf>) {
        for input in inputs {
            match self.temp.acquire(&input.location, &input.headers).await {
                Ok(path) => {
                    input.location = path.to_string_lossy().into_owned();
                    input.headers.clear();
                    temp_paths.push(path);
                }
                Err(err) => {
                    warn!(url = input.location, error = %err, "prefetch failed, streaming remotely");
                }
            }
        }
    }

    /// Advisory output size: first input's length scaled by the plan's
    /// multiplier. Best effort; `None` when the source will not say.
    async fn estimate_length(&self, plan: &StreamPlan, inputs: &[InputSource]) -> Option<u64> {
        let first = inputs.first()?;
        let source_length = if first.location.starts_with("http://")
            || first.location.starts_with("https://")
        {
            let response = self
                .client
                .head(&first.location)
                .headers(header_map(&first.headers))
                .send()
                .await
                .ok()?;
            if !response.status().is_success() {
                return None;
            }
            // HEAD responses carry the length as a header, not a body hint.
            response
                .headers()
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())?
        } else {
            tokio::fs::metadata(&first.location).await.ok()?.len()
        };
        Some((source_length as f64 * plan.size_multiplier) as u64)
    }

    async fn cleanup(&self, operation: &Uuid, temp_paths: &[PathBuf]) {
        for path in temp_paths {
            self.temp.release(path).await;
        }
        self.registry.deregister(operation);
    }
}

/// Race one starting-phase step against the operation's deadline and its
/// cancellation token, so a hung origin can never stall an operation past
/// its lifetime.
async fn bounded<T>(
    deadline: Instant,
    cancel: &CancellationToken,
    step: impl Future<Output = Result<T, StreamError>>,
) -> Result<T, StreamError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StreamError::Cancelled),
        _ = tokio::time::sleep_until(deadline) => Err(StreamError::DeadlineExceeded),
        result = step => result,
    }
}

/// Spawn the command and relay its stdout into the sink until it exits, the
/// deadline fires, the consumer goes away, or the operation is cancelled.
pub(crate) async fn stream_child(
    mut command: Command,
    program: &str,
    deadline: Instant,
    kill_grace: Duration,
    sink: &ByteSink,
    cancel: &CancellationToken,
) -> Result<(), StreamError> {
    let mut child = command.spawn().map_err(|err| StreamError::Spawn {
        program: program.to_string(),
        reason: err.to_string(),
    })?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| StreamError::invalid_plan("child spawned without stdout pipe"))?;

    let mut buf = BytesMut::with_capacity(64 * 1024);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                terminate(&mut child, kill_grace).await;
                return Err(StreamError::Cancelled);
            }
            _ = tokio::time::sleep_until(deadline) => {
                terminate(&mut child, kill_grace).await;
                return Err(StreamError::DeadlineExceeded);
            }
            _ = sink.closed() => {
                terminate(&mut child, kill_grace).await;
                return Err(StreamError::ClientGone);
            }
            read = stdout.read_buf(&mut buf) => match read {
                Ok(0) => break,
                Ok(_) => {
                    if sink.send(Ok(buf.split().freeze())).await.is_err() {
                        terminate(&mut child, kill_grace).await;
                        return Err(StreamError::ClientGone);
                    }
                }
                Err(err) => {
                    terminate(&mut child, kill_grace).await;
                    return Err(err.into());
                }
            },
        }
    }

    let status = child.wait().await?;
    if status.success() {
        Ok(())
    } else {
        Err(StreamError::ProcessExit {
            code: status.code(),
        })
    }
}

/// Graceful signal, bounded grace period, forced kill.
async fn terminate(child: &mut Child, kill_grace: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: signalling our own child by pid.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
        if tokio::time::timeout(kill_grace, child.wait()).await.is_ok() {
            return;
        }
        debug!(pid, "child ignored the graceful signal, killing");
    }

    let _ = child.kill().await;
}
