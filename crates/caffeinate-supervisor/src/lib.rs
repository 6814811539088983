//! # Caffeinate Supervisor
//!
//! Lifecycle management for the macOS `caffeinate` helper process.
//!
//! A [`CaffeinateSupervisor`] owns at most one helper process at a time and
//! exposes `start`, `stop`, `wait`, `running` and `managed_pid`. All of them
//! may be called concurrently from any number of tasks.
//!
//! **Architecture:**
//! ```text
//! CaffeinateConfig (flags -> argument list)
//!       ↓ snapshotted by
//! CaffeinateSupervisor::start()
//!       ↓ launches through
//! ProcessLauncher (caffeinate-process)
//!       ↓ child handed to
//! observer task (sole reaper, fires the per-run completion signal)
//! ```
//!
//! ```rust,no_run
//! use caffeinate_supervisor::{CaffeinateConfig, CaffeinateSupervisor};
//!
//! # async fn run() -> caffeinate_supervisor::ProcessResult<()> {
//! let config = CaffeinateConfig {
//!     system: true,
//!     timeout_secs: 2,
//!     ..Default::default()
//! };
//! let supervisor = CaffeinateSupervisor::new("sleep-guard", config);
//! supervisor.start().await?;
//! assert!(supervisor.running());
//! supervisor.wait().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod supervisor;

pub use config::{CaffeinateConfig, DEFAULT_EXECUTABLE};
pub use supervisor::{CaffeinateSupervisor, LaunchFailurePolicy, RunOutcome};

pub use caffeinate_common::{ProcessError, ProcessResult};
pub use caffeinate_process::{CommandLauncher, ProcessHandle, ProcessLauncher};
pub use caffeinate_state::{StateTransition, SupervisorState};
