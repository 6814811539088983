#![allow(dead_code)]

use caffeinate_supervisor::{CaffeinateConfig, CaffeinateSupervisor, LaunchFailurePolicy};
use std::path::PathBuf;

/// Path of the `fake-caffeinate` binary built alongside these tests.
pub fn fake_caffeinate_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fake-caffeinate"))
}

/// `{system: true, timeout_secs}` pointed at the fake helper.
pub fn system_sleep_config(timeout_secs: u64) -> CaffeinateConfig {
    CaffeinateConfig {
        system: true,
        timeout_secs,
        executable: fake_caffeinate_path(),
        ..Default::default()
    }
}

pub fn supervisor(id: &str, config: CaffeinateConfig) -> CaffeinateSupervisor {
    init_tracing();
    CaffeinateSupervisor::new(id, config)
        .with_launch_failure_policy(LaunchFailurePolicy::ReturnError)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
