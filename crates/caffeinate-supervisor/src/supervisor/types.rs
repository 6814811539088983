//! Types shared between the supervisor handle and its observer task.

use caffeinate_common::ProcessResult;
use chrono::{DateTime, Utc};
use std::io;
use tokio::sync::{mpsc, oneshot, watch};

/// What `start` does when the helper executable cannot be launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchFailurePolicy {
    /// Log the failure and terminate the calling process with status 1.
    /// Without its helper the supervisor has nothing useful to do.
    #[default]
    Abort,
    /// Return `ProcessError::SpawnFailed` from `start` and stay idle.
    ReturnError,
}

/// How one helper run ended.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Sequence number of the run, starting at 1.
    pub run: u64,
    pub pid: u32,
    pub exit_code: Option<i32>,
    /// Terminating signal, if the helper was killed.
    pub signal: Option<i32>,
    /// `stop` (directly or through a preempting `start`) killed this run.
    pub stop_requested: bool,
    pub started_at: DateTime<Utc>,
    pub exited_at: DateTime<Utc>,
    /// The run's exit error, including `Killed` for a run ended by `stop`.
    pub result: ProcessResult<()>,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Reply channel for a kill request; carries the `start_kill` result.
pub(crate) type KillReply = oneshot::Sender<io::Result<()>>;

/// Per-run completion signal. `None` until the observer publishes the outcome.
pub(crate) type CompletionReceiver = watch::Receiver<Option<RunOutcome>>;

/// Bookkeeping for the live helper. Present iff a helper is running.
#[derive(Debug)]
pub(crate) struct ActiveRun {
    pub run: u64,
    pub pid: u32,
    pub kill_tx: mpsc::Sender<KillReply>,
    pub completion: CompletionReceiver,
}
