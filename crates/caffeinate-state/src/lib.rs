use caffeinate_common::{ProcessError, ProcessResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_HISTORY: usize = 100;

/// Lifecycle state of a supervised helper process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupervisorState {
    /// No helper process exists
    Idle,
    /// The helper is being spawned
    Launching,
    /// The helper is alive and owned by its observer
    Running,
    /// A kill has been delivered and the observer has not reaped the helper yet
    Exiting,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Launching => write!(f, "launching"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::Exiting => write!(f, "exiting"),
        }
    }
}

/// Represents a state transition with timestamp and optional reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: SupervisorState,
    pub to_state: SupervisorState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// State machine enforcing `Idle -> Launching -> Running -> Exiting -> Idle`.
///
/// `Running -> Idle` covers a helper that exits on its own (timeout elapsed or
/// the watched pid disappeared). `Launching -> Idle` is only taken when the
/// caller opted out of aborting on launch failure.
#[derive(Debug, Clone)]
pub struct SupervisorStateMachine {
    supervisor_id: String,
    current_state: SupervisorState,
    state_history: Vec<StateTransition>,
}

impl SupervisorStateMachine {
    pub fn new(supervisor_id: &str) -> Self {
        Self {
            supervisor_id: supervisor_id.to_string(),
            current_state: SupervisorState::Idle,
            state_history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> SupervisorState {
        self.current_state
    }

    /// Most recent transitions, oldest first (bounded).
    pub fn state_history(&self) -> &[StateTransition] {
        &self.state_history
    }

    /// Check if a transition from current state to target state is valid
    pub fn is_valid_transition(&self, target_state: SupervisorState) -> bool {
        use SupervisorState::*;

        match (self.current_state, target_state) {
            (Idle, Launching) => true,

            (Launching, Running) => true,
            (Launching, Idle) => true,

            (Running, Exiting) => true,
            (Running, Idle) => true,

            (Exiting, Idle) => true,

            (state, target) if state == target => true,

            _ => false,
        }
    }

    /// Transition to a new state with optional reason
    pub fn transition_to(
        &mut self,
        target_state: SupervisorState,
        reason: Option<String>,
    ) -> ProcessResult<()> {
        if !self.is_valid_transition(target_state) {
            return Err(ProcessError::invalid_state(
                &self.supervisor_id,
                format!("a state reachable from {}", self.current_state),
                target_state.to_string(),
            ));
        }

        if target_state == self.current_state {
            return Ok(());
        }

        let from_state = self.current_state;
        self.state_history.push(StateTransition {
            from_state,
            to_state: target_state,
            timestamp: Utc::now(),
            reason,
        });
        if self.state_history.len() > MAX_HISTORY {
            self.state_history.remove(0);
        }

        self.current_state = target_state;

        tracing::debug!(
            "Supervisor {} transitioned from {} to {}",
            self.supervisor_id,
            from_state,
            target_state
        );

        Ok(())
    }

    pub fn transition_to_launching(&mut self) -> ProcessResult<()> {
        self.transition_to(
            SupervisorState::Launching,
            Some("Helper launch requested".to_string()),
        )
    }

    pub fn transition_to_running(&mut self, pid: u32) -> ProcessResult<()> {
        self.transition_to(
            SupervisorState::Running,
            Some(format!("Helper launched with PID {}", pid)),
        )
    }

    pub fn transition_to_exiting(&mut self) -> ProcessResult<()> {
        self.transition_to(
            SupervisorState::Exiting,
            Some("Kill signal delivered".to_string()),
        )
    }

    pub fn transition_to_idle(&mut self, reason: String) -> ProcessResult<()> {
        self.transition_to(SupervisorState::Idle, Some(reason))
    }
}
