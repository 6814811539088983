//! Observer task: the only owner of the helper's process handle.
//!
//! It reaps the helper (preventing a zombie), serves kill requests while the
//! helper is alive, and is the only place that clears the active run and
//! fires the run's completion signal.

use super::types::{KillReply, RunOutcome};
use super::Inner;
use caffeinate_common::{ProcessError, ProcessResult};
use caffeinate_process::ProcessHandle;
use chrono::{DateTime, Utc};
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

pub(super) struct Observation {
    pub inner: Arc<Inner>,
    pub run: u64,
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub child: Box<dyn ProcessHandle>,
    pub kill_rx: mpsc::Receiver<KillReply>,
    pub done_tx: watch::Sender<Option<RunOutcome>>,
}

pub(super) async fn observe(observation: Observation) {
    let Observation {
        inner,
        run,
        pid,
        started_at,
        mut child,
        mut kill_rx,
        done_tx,
    } = observation;

    debug!("Observer started for {} (PID: {}, run {})", inner.id, pid, run);

    let mut stop_requested = false;
    let waited = loop {
        tokio::select! {
            status = child.wait() => break status,
            Some(reply) = kill_rx.recv() => {
                let delivered = child.start_kill();
                if delivered.is_ok() {
                    stop_requested = true;
                    let exiting = inner.state.lock().machine.transition_to_exiting();
                    if let Err(e) = exiting {
                        warn!("Unexpected state while stopping {}: {}", inner.id, e);
                    }
                }
                // the stopper may have been cancelled; the kill stands either way
                let _ = reply.send(delivered);
            }
        }
    };

    // pending kill requests now see a dropped reply and fall through to waiting
    drop(kill_rx);

    let (exit_code, signal, result) = classify_exit(&inner.id, &waited);
    match &waited {
        Ok(status) if status.success() => {
            info!("Helper for {} (PID: {}) exited successfully", inner.id, pid);
        }
        Ok(status) if stop_requested => {
            info!("Helper for {} (PID: {}) stopped: {}", inner.id, pid, status);
        }
        Ok(status) => {
            warn!("Helper for {} (PID: {}) exited abnormally: {}", inner.id, pid, status);
        }
        Err(e) => {
            error!("Failed to wait for helper for {} (PID: {}): {}", inner.id, pid, e);
        }
    }

    let outcome = RunOutcome {
        run,
        pid,
        exit_code,
        signal,
        stop_requested,
        started_at,
        exited_at: Utc::now(),
        result,
    };

    let mut state = inner.state.lock();
    if state.active.as_ref().map(|active| active.run) == Some(run) {
        state.active = None;
        let reason = if stop_requested {
            "Helper killed and reaped"
        } else {
            "Helper exited and reaped"
        };
        if let Err(e) = state.machine.transition_to_idle(reason.to_string()) {
            warn!("Unexpected state after reaping helper for {}: {}", inner.id, e);
        }
    } else {
        warn!("Observer for {} finished stale run {}", inner.id, run);
    }
    state.last_outcome = Some(outcome.clone());

    // published under the lock: a waiter sees either the active run or this outcome
    done_tx.send_replace(Some(outcome));
    drop(state);

    debug!("Observer completed for {} (PID: {}, run {})", inner.id, pid, run);
}

/// Exit code, terminating signal and exit error of one run.
///
/// A signal is an exit error even when `stop` sent it; the outcome records
/// whether the kill was requested.
fn classify_exit(
    id: &str,
    waited: &io::Result<ExitStatus>,
) -> (Option<i32>, Option<i32>, ProcessResult<()>) {
    let status = match waited {
        Ok(status) => status,
        Err(e) => return (None, None, Err(ProcessError::wait_failed(id, e.to_string()))),
    };

    let exit_code = status.code();
    let signal = exit_signal(status);

    let result = if status.success() {
        Ok(())
    } else if let Some(sig) = signal {
        Err(ProcessError::killed(id, signal_name(sig)))
    } else {
        Err(ProcessError::crashed(id, exit_code))
    };

    (exit_code, signal, result)
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(unix)]
fn signal_name(sig: i32) -> String {
    nix::sys::signal::Signal::try_from(sig)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| format!("signal {}", sig))
}

#[cfg(not(unix))]
fn signal_name(sig: i32) -> String {
    format!("signal {}", sig)
}
