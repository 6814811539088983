//! Error types for helper process supervision.
//!
//! [`ProcessError`] is `Clone` on purpose: the exit result of one helper run
//! is handed to every task waiting on that run, so it must be shareable.
//! Underlying `std::io::Error` / errno values are therefore flattened into
//! their display strings.

use thiserror::Error;

/// Errors produced while launching, stopping or reaping the helper process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The helper executable could not be started.
    #[error("Process spawn failed: {id} - {reason}")]
    SpawnFailed { id: String, reason: String },

    /// The kill signal could not be delivered to the running helper.
    #[error("Process stop failed: {id} - {reason}")]
    StopFailed { id: String, reason: String },

    /// The helper exited on its own with a non-zero status.
    #[error("Process crashed: {id} - exit code {exit_code:?}")]
    Crashed { id: String, exit_code: Option<i32> },

    /// The helper was terminated by a signal, including the SIGKILL sent by
    /// `stop`.
    #[error("Process killed: {id} - {signal}")]
    Killed { id: String, signal: String },

    /// Reaping the helper failed at the OS level.
    #[error("Process wait failed: {id} - {reason}")]
    WaitFailed { id: String, reason: String },

    #[error("Process state error: {id} - expected {expected}, got {actual}")]
    InvalidState {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("Process configuration error: {id} - {reason}")]
    Configuration { id: String, reason: String },

    /// The observer of a run went away without publishing its outcome.
    #[error("Completion channel closed unexpectedly for process '{id}'")]
    CompletionChannelClosed { id: String },
}

impl ProcessError {
    pub fn spawn_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn stop_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn crashed(id: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Crashed {
            id: id.into(),
            exit_code,
        }
    }

    pub fn killed(id: impl Into<String>, signal: impl Into<String>) -> Self {
        Self::Killed {
            id: id.into(),
            signal: signal.into(),
        }
    }

    pub fn wait_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::WaitFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_state(
        id: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            id: id.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn configuration(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn completion_channel_closed(id: impl Into<String>) -> Self {
        Self::CompletionChannelClosed { id: id.into() }
    }

    /// Whether this error describes how a helper run ended, as opposed to a
    /// failure of the supervisor's own control operations.
    pub fn is_exit_error(&self) -> bool {
        matches!(
            self,
            Self::Crashed { .. } | Self::Killed { .. } | Self::WaitFailed { .. }
        )
    }
}

/// Result type for process operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
