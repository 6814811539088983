//! E2E: launch failure handling in a real process.
//!
//! The default policy terminates the whole process, so these run the
//! `launch-missing-helper` binary and inspect its exit status.

use std::process::{Command, Output};

fn launch_missing_helper(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_launch-missing-helper"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("failed to run launch-missing-helper")
}

#[test]
fn default_policy_exits_with_status_one() {
    let output = launch_missing_helper(&[]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
    assert!(stderr.contains("Error starting helper for missing-helper"));
    assert!(!stderr.contains("Start returned"));
}

#[test]
fn return_error_policy_hands_the_failure_back() {
    let output = launch_missing_helper(&["--return-error"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert_eq!(output.status.code(), Some(2), "stderr: {}", stderr);
    assert!(stderr.contains("Start returned: Process spawn failed: missing-helper"));
}
