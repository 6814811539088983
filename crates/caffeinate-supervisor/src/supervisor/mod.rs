//! CaffeinateSupervisor - single-instance lifecycle control for the helper.
//!
//! Concurrency model:
//! - `state` (a sync mutex) guards the run bookkeeping and is never held
//!   across an `.await`.
//! - `lifecycle` (an async mutex) serialises `start` and `stop`, so a
//!   preempting `start` cannot interleave with another one and leave two
//!   helpers alive. The observer task never takes it.
//! - Each run gets a fresh `watch` channel as its completion signal. Waiters
//!   clone the receiver under `state` and wait after releasing it, so a new
//!   run replacing the signal never strands them.

mod observer;
mod types;


pub use types::{LaunchFailurePolicy, RunOutcome};

use crate::config::CaffeinateConfig;
use caffeinate_common::{ProcessError, ProcessResult};
use caffeinate_process::{format_command_line, CommandLauncher, ProcessLauncher};
use caffeinate_state::{StateTransition, SupervisorState, SupervisorStateMachine};
use observer::Observation;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};
use types::{ActiveRun, CompletionReceiver};

/// Supervises one `caffeinate` helper process.
///
/// Cloning is cheap and every clone controls the same helper.
#[derive(Clone)]
pub struct CaffeinateSupervisor {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    id: String,
    launcher: Arc<dyn ProcessLauncher>,
    launch_failure: Mutex<LaunchFailurePolicy>,
    config: Mutex<CaffeinateConfig>,
    state: Mutex<RunState>,
    lifecycle: tokio::sync::Mutex<()>,
}

struct RunState {
    machine: SupervisorStateMachine,
    active: Option<ActiveRun>,
    last_outcome: Option<RunOutcome>,
    runs: u64,
}

impl CaffeinateSupervisor {
    /// Create a supervisor that launches the configured executable directly.
    pub fn new(id: impl Into<String>, config: CaffeinateConfig) -> Self {
        Self::with_launcher(id, config, Arc::new(CommandLauncher))
    }

    /// Create a supervisor that launches through `launcher`.
    pub fn with_launcher(
        id: impl Into<String>,
        config: CaffeinateConfig,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        let id = id.into();
        Self {
            inner: Arc::new(Inner {
                launcher,
                launch_failure: Mutex::new(LaunchFailurePolicy::default()),
                config: Mutex::new(config),
                state: Mutex::new(RunState {
                    machine: SupervisorStateMachine::new(&id),
                    active: None,
                    last_outcome: None,
                    runs: 0,
                }),
                lifecycle: tokio::sync::Mutex::new(()),
                id,
            }),
        }
    }

    pub fn with_launch_failure_policy(self, policy: LaunchFailurePolicy) -> Self {
        self.set_launch_failure_policy(policy);
        self
    }

    pub fn set_launch_failure_policy(&self, policy: LaunchFailurePolicy) {
        *self.inner.launch_failure.lock() = policy;
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Snapshot of the configuration the next `start` will use.
    pub fn config(&self) -> CaffeinateConfig {
        self.inner.config.lock().clone()
    }

    /// Replace the configuration. A running helper keeps the arguments it was
    /// launched with until the next `start`.
    pub fn set_config(&self, config: CaffeinateConfig) {
        *self.inner.config.lock() = config;
    }

    pub fn update_config<F>(&self, update: F)
    where
        F: FnOnce(&mut CaffeinateConfig),
    {
        let mut config = self.inner.config.lock();
        update(&mut *config);
    }

    /// Launch the helper with the current configuration.
    ///
    /// A helper that is still running is stopped (and reaped) first, so at
    /// most one helper exists per supervisor. Returns as soon as the new
    /// helper is spawned.
    ///
    /// If the helper cannot be launched, the default
    /// [`LaunchFailurePolicy::Abort`] exits the calling process with status 1.
    pub async fn start(&self) -> ProcessResult<()> {
        let _gate = self.inner.lifecycle.lock().await;

        if self.running() {
            info!("Preempting running helper for {}", self.inner.id);
            match self.stop_locked().await {
                Ok(()) => {}
                Err(e) if e.is_exit_error() => {
                    info!("Preempted helper for {} ended: {}", self.inner.id, e);
                }
                Err(e) => return Err(e),
            }
        }

        let config = self.config();
        let args = config.to_args();
        info!(
            "Command for {}: {}",
            self.inner.id,
            format_command_line(&config.executable, &args)
        );

        self.inner.state.lock().machine.transition_to_launching()?;

        let child = match self.inner.launcher.launch(&config.executable, &args) {
            Ok(child) => child,
            Err(e) => return Err(self.launch_failed(e)),
        };
        let pid = child.id().unwrap_or(0);
        let started_at = chrono::Utc::now();

        let (kill_tx, kill_rx) = mpsc::channel(1);
        let (done_tx, done_rx) = watch::channel(None);

        let run = {
            let mut state = self.inner.state.lock();
            state.machine.transition_to_running(pid)?;
            state.runs += 1;
            let run = state.runs;
            state.active = Some(ActiveRun {
                run,
                pid,
                kill_tx,
                completion: done_rx,
            });
            run
        };

        tokio::spawn(observer::observe(Observation {
            inner: Arc::clone(&self.inner),
            run,
            pid,
            started_at,
            child,
            kill_rx,
            done_tx,
        }));

        info!("Helper started for {} (PID: {}, run {})", self.inner.id, pid, run);
        Ok(())
    }

    /// Kill the running helper and wait until it has been reaped.
    ///
    /// Returns the run's exit result, which is `ProcessError::Killed` when
    /// the kill is what ended it. Returns `Ok(())` immediately when nothing is
    /// running. A failure to deliver the kill is returned as
    /// `ProcessError::StopFailed` without waiting.
    pub async fn stop(&self) -> ProcessResult<()> {
        let _gate = self.inner.lifecycle.lock().await;
        self.stop_locked().await
    }

    /// Wait until the current run ends and return its exit result.
    ///
    /// When nothing is running this returns the result of the last finished
    /// run (or `Ok(())` if there never was one) without blocking.
    pub async fn wait(&self) -> ProcessResult<()> {
        let completion = {
            let state = self.inner.state.lock();
            match state.active.as_ref() {
                Some(active) => active.completion.clone(),
                None => {
                    return state
                        .last_outcome
                        .as_ref()
                        .map_or(Ok(()), |outcome| outcome.result.clone())
                }
            }
        };

        self.wait_on(completion).await?.result
    }

    /// Whether a helper is currently alive. May briefly lag an exit that the
    /// observer has not processed yet.
    pub fn running(&self) -> bool {
        self.inner.state.lock().active.is_some()
    }

    /// PID of the running helper, `None` when idle.
    pub fn managed_pid(&self) -> Option<u32> {
        self.inner.state.lock().active.as_ref().map(|active| active.pid)
    }

    pub fn state(&self) -> SupervisorState {
        self.inner.state.lock().machine.current_state()
    }

    /// Recent state transitions, oldest first.
    pub fn state_history(&self) -> Vec<StateTransition> {
        self.inner.state.lock().machine.state_history().to_vec()
    }

    /// Outcome of the most recently finished run.
    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.inner.state.lock().last_outcome.clone()
    }

    /// `stop` body; the caller holds the lifecycle gate.
    async fn stop_locked(&self) -> ProcessResult<()> {
        let (run, pid, kill_tx, completion) = {
            let state = self.inner.state.lock();
            match state.active.as_ref() {
                Some(active) => (
                    active.run,
                    active.pid,
                    active.kill_tx.clone(),
                    active.completion.clone(),
                ),
                None => {
                    debug!("No helper to stop for {}", self.inner.id);
                    return Ok(());
                }
            }
        };

        info!("Stopping helper for {} (PID: {}, run {})", self.inner.id, pid, run);

        let (reply_tx, reply_rx) = oneshot::channel();
        if kill_tx.send(reply_tx).await.is_ok() {
            match reply_rx.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(
                        "Failed to kill helper for {} (PID: {}): {}",
                        self.inner.id, pid, e
                    );
                    return Err(ProcessError::stop_failed(&self.inner.id, e.to_string()));
                }
                Err(_) => {
                    debug!("Helper for {} exited before the kill was delivered", self.inner.id);
                }
            }
        } else {
            debug!("Observer for {} already finished run {}", self.inner.id, run);
        }

        self.wait_on(completion).await?.result
    }

    async fn wait_on(&self, mut completion: CompletionReceiver) -> ProcessResult<RunOutcome> {
        let outcome = completion
            .wait_for(Option::is_some)
            .await
            .map_err(|_| ProcessError::completion_channel_closed(&self.inner.id))?
            .as_ref()
            .cloned();

        outcome.ok_or_else(|| ProcessError::completion_channel_closed(&self.inner.id))
    }

    fn launch_failed(&self, err: ProcessError) -> ProcessError {
        let err = match err {
            ProcessError::SpawnFailed { reason, .. } => {
                ProcessError::spawn_failed(&self.inner.id, reason)
            }
            other => other,
        };

        error!("Error starting helper for {}: {}", self.inner.id, err);

        if *self.inner.launch_failure.lock() == LaunchFailurePolicy::Abort {
            std::process::exit(1);
        }

        let mut state = self.inner.state.lock();
        if let Err(e) = state.machine.transition_to_idle(format!("Launch failed: {}", err)) {
            warn!("Unexpected state after launch failure for {}: {}", self.inner.id, e);
        }
        err
    }
}

impl std::fmt::Debug for CaffeinateSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaffeinateSupervisor")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("pid", &self.managed_pid())
            .finish()
    }
}
