// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Worker supervision
//!
//! Every analysis request gets its own isolated unit of execution:
//!
//! - [`WorkerSupervisor`] spawns a child process (`wcagbot worker`) per
//!   request and talks to it over stdin/stdout
//! - [`TaskAnalyzer`] runs the pipeline on a fresh tokio task instead
//!
//! Both implement [`AnalysisService`], the only thing callers see. Neither
//! limits concurrency nor enforces a timeout, and there is no cancellation
//! once a worker has started.
//!
//! Process lifecycle:
//!
//! ```text
//! Spawned → AwaitingReply → Completed | Failed | Crashed
//! ```
//!
//! The child is terminated on every path out of `AwaitingReply`.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::AuditSource;
use crate::config::ClassificationMode;
use crate::error::{Error, Result};
use crate::result::AnalysisResult;
use crate::worker::{self, decode_line, encode_line, AnalysisRequest, WorkerReply};

/// Capability to turn one request into one result
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Resolves exactly once per request
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult>;
}

/// Lifecycle of one supervised worker process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Spawned,
    AwaitingReply,
    /// A reply (success or error) arrived
    Completed,
    /// The channel failed before any reply
    Failed,
    /// Non-zero exit or signal before any reply
    Crashed,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Spawned => write!(f, "spawned"),
            WorkerState::AwaitingReply => write!(f, "awaiting-reply"),
            WorkerState::Completed => write!(f, "completed"),
            WorkerState::Failed => write!(f, "failed"),
            WorkerState::Crashed => write!(f, "crashed"),
        }
    }
}

/// How a worker process is launched
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Re-run the current binary with the hidden `worker` subcommand,
    /// forwarding the config file path
    pub fn current_exe(config_path: &str) -> Result<Self> {
        let program = std::env::current_exe()
            .map_err(|e| Error::Config(format!("Cannot locate own executable: {}", e)))?;
        Ok(Self::new(program, ["--config", config_path, "worker"]))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        cmd
    }
}

/// What came back from a worker before it was terminated
enum Exchange {
    Reply(WorkerReply),
    Fault(String),
    Exited(Option<i32>),
}

/// Spawns one isolated worker process per analysis request
pub struct WorkerSupervisor {
    command: WorkerCommand,
}

impl WorkerSupervisor {
    pub fn new(command: WorkerCommand) -> Self {
        Self { command }
    }

    async fn supervise(&self, analysis_id: Uuid, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let mut child = self.command.command().spawn().map_err(|e| {
            error!(%analysis_id, "Failed to spawn worker: {}", e);
            Error::WorkerTransport(format!("failed to spawn worker: {}", e))
        })?;

        let mut state = WorkerState::Spawned;
        debug!(%analysis_id, pid = ?child.id(), "Worker {}", state);

        state = WorkerState::AwaitingReply;
        debug!(%analysis_id, "Worker {}", state);
        let exchange = exchange(&mut child, request).await;

        let (state, outcome) = match exchange {
            Exchange::Reply(reply) => (WorkerState::Completed, reply.into_result()),
            Exchange::Fault(message) => (WorkerState::Failed, Err(Error::WorkerTransport(message))),
            Exchange::Exited(code) => (WorkerState::Crashed, Err(Error::WorkerCrashed { code })),
        };

        terminate(&mut child, analysis_id).await;

        match &outcome {
            Ok(_) => info!(%analysis_id, "Worker {} for {}", state, request.url),
            Err(e) => warn!(%analysis_id, "Worker {} for {}: {}", state, request.url, e),
        }

        outcome
    }
}

#[async_trait]
impl AnalysisService for WorkerSupervisor {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        request.validate()?;

        let analysis_id = Uuid::new_v4();
        info!(%analysis_id, "Starting analysis of {}", request.url);
        self.supervise(analysis_id, &request).await
    }
}

/// Send the request, then wait for the single reply or the process exit
async fn exchange(child: &mut Child, request: &AnalysisRequest) -> Exchange {
    let line = match encode_line(request) {
        Ok(line) => line,
        Err(e) => return Exchange::Fault(format!("could not encode request: {}", e)),
    };

    let Some(mut stdin) = child.stdin.take() else {
        return Exchange::Fault("worker stdin unavailable".to_string());
    };
    let Some(stdout) = child.stdout.take() else {
        return Exchange::Fault("worker stdout unavailable".to_string());
    };

    let sent = async {
        stdin.write_all(&line).await?;
        stdin.flush().await
    }
    .await;
    // Closing stdin tells the worker no further message is coming.
    drop(stdin);

    if let Err(e) = sent {
        // A worker that died early shows up as a broken pipe here; prefer
        // reporting its exit status.
        return after_silence(child, format!("could not send request: {}", e)).await;
    }

    let mut reader = BufReader::new(stdout);
    let mut reply = String::new();
    match reader.read_line(&mut reply).await {
        Ok(0) => after_silence(child, "worker exited without replying".to_string()).await,
        Ok(_) => match decode_line::<WorkerReply>(&reply) {
            Ok(reply) => Exchange::Reply(reply),
            Err(e) => Exchange::Fault(format!("unreadable worker reply: {}", e)),
        },
        Err(e) => Exchange::Fault(format!("could not read worker reply: {}", e)),
    }
}

/// The channel went quiet: classify by how the process ended
async fn after_silence(child: &mut Child, fault: String) -> Exchange {
    match child.wait().await {
        Ok(status) if status.success() => Exchange::Fault(fault),
        Ok(status) => Exchange::Exited(status.code()),
        Err(e) => Exchange::Fault(format!("{} (wait failed: {})", fault, e)),
    }
}

/// Make sure the child is gone, whatever state it is in
async fn terminate(child: &mut Child, analysis_id: Uuid) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!(%analysis_id, "Worker already exited: {}", status);
        }
        Ok(None) => {
            if let Err(e) = child.kill().await {
                warn!(%analysis_id, "Failed to kill worker: {}", e);
            } else {
                debug!(%analysis_id, "Worker terminated");
            }
        }
        Err(e) => {
            warn!(%analysis_id, "Could not query worker status: {}", e);
            if let Err(e) = child.kill().await {
                warn!(%analysis_id, "Failed to kill worker: {}", e);
            }
        }
    }
}

/// Runs each analysis on its own tokio task in the current process.
///
/// A panic inside the pipeline is contained by the task boundary and
/// surfaces as a transport fault for that request only.
pub struct TaskAnalyzer {
    source: Arc<dyn AuditSource>,
    mode: ClassificationMode,
}

impl TaskAnalyzer {
    pub fn new(source: Arc<dyn AuditSource>, mode: ClassificationMode) -> Self {
        Self { source, mode }
    }
}

#[async_trait]
impl AnalysisService for TaskAnalyzer {
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        request.validate()?;

        let analysis_id = Uuid::new_v4();
        info!(%analysis_id, "Starting in-process analysis of {}", request.url);

        let source = Arc::clone(&self.source);
        let mode = self.mode;
        let handle = tokio::spawn(async move { worker::run_pipeline(source.as_ref(), &request, mode).await });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%analysis_id, "Analysis task aborted: {}", e);
                Err(Error::WorkerTransport(format!("analysis task aborted: {}", e)))
            }
        }
    }
}
