//! Process existence checking.

use caffeinate_common::ProcessResult;

/// Check if a process with the given PID exists and is running.
///
/// On Unix this is `kill(pid, 0)`: no signal is sent, only existence and
/// permission are checked. A process owned by another user still exists.
///
/// # Returns
///
/// * `Ok(true)` - Process exists
/// * `Ok(false)` - Process does not exist
/// * `Err(_)` - The check itself failed
pub fn process_exists(pid: u32) -> ProcessResult<bool> {
    #[cfg(unix)]
    {
        process_exists_unix(pid)
    }

    #[cfg(not(unix))]
    {
        Err(caffeinate_common::ProcessError::configuration(
            pid.to_string(),
            "process existence checks are only supported on unix",
        ))
    }
}

#[cfg(unix)]
fn process_exists_unix(pid: u32) -> ProcessResult<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // pid 0 addresses our own process group, never a single process
    if pid == 0 || pid > i32::MAX as u32 {
        return Ok(false);
    }

    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(Errno::EPERM) => Ok(true),
        Err(e) => Err(caffeinate_common::ProcessError::configuration(
            pid.to_string(),
            format!("Failed to check process: {}", e),
        )),
    }
}
