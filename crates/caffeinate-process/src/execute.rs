//! Process execution primitives.
//!
//! The supervisor never builds a `Command` itself. It goes through a
//! [`ProcessLauncher`], which is the seam tests use to substitute the helper,
//! and drives the result only through the [`ProcessHandle`] it returns.

use async_trait::async_trait;
use caffeinate_common::{ProcessError, ProcessResult};
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, Command};
use tracing::debug;

/// Kill and reap access to one launched process.
///
/// The supervisor hands the handle to a single observer task, which is the
/// only caller of `wait` and `start_kill` for the lifetime of the run.
#[async_trait]
pub trait ProcessHandle: Send + fmt::Debug {
    /// OS pid, `None` once the process has been reaped.
    fn id(&self) -> Option<u32>;

    /// Deliver SIGKILL without waiting for the exit.
    fn start_kill(&mut self) -> io::Result<()>;

    /// Reap the process. Must be cancel safe.
    async fn wait(&mut self) -> io::Result<ExitStatus>;
}

#[async_trait]
impl ProcessHandle for Child {
    fn id(&self) -> Option<u32> {
        Child::id(self)
    }

    fn start_kill(&mut self) -> io::Result<()> {
        Child::start_kill(self)
    }

    async fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self).await
    }
}

/// Spawns a subprocess from an executable path and an ordered argument list.
pub trait ProcessLauncher: Send + Sync + fmt::Debug {
    fn launch(&self, executable: &Path, args: &[String]) -> ProcessResult<Box<dyn ProcessHandle>>;
}

/// Launches the executable directly with `tokio::process::Command`.
///
/// Standard streams are detached (the helper's output is not interpreted) and
/// the child is killed if its handle is dropped without being reaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandLauncher;

impl ProcessLauncher for CommandLauncher {
    fn launch(&self, executable: &Path, args: &[String]) -> ProcessResult<Box<dyn ProcessHandle>> {
        debug!("Launching {}", format_command_line(executable, args));

        let child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ProcessError::spawn_failed(executable.display().to_string(), e.to_string()))?;
        Ok(Box::new(child))
    }
}

/// Render an invocation the way a shell user would type it, for log lines.
pub fn format_command_line(executable: &Path, args: &[String]) -> String {
    if args.is_empty() {
        executable.display().to_string()
    } else {
        format!("{} {}", executable.display(), args.join(" "))
    }
}
