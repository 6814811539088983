//! E2E: supervisor lifecycle against `fake-caffeinate`.
//!
//! These run real subprocesses and rely on wall-clock timing, so every
//! assertion leaves about a second of slack around the helper's timeout.

mod common;

use caffeinate_process::process_exists;
use caffeinate_supervisor::{CaffeinateConfig, ProcessError, SupervisorState};
use common::{fake_caffeinate_path, supervisor, system_sleep_config};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};

const TEST_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn helper_runs_until_its_timeout() {
    let caffeinate = supervisor("basic", system_sleep_config(2));

    caffeinate.start().await.unwrap();
    sleep(Duration::from_secs(1)).await;
    assert!(caffeinate.running(), "not running after one second");

    sleep(Duration::from_secs(3)).await;
    assert!(!caffeinate.running(), "still running after four seconds");

    caffeinate.wait().await.unwrap();
    let outcome = caffeinate.last_outcome().unwrap();
    assert_eq!(outcome.exit_code, Some(0));
    assert!(!outcome.stop_requested);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restart_with_longer_timeout_extends_the_active_window() {
    let caffeinate = supervisor("preempt", system_sleep_config(2));

    caffeinate.start().await.unwrap();
    sleep(Duration::from_secs(1)).await;
    assert!(caffeinate.running(), "not running after one second");
    let first = caffeinate.managed_pid().unwrap();

    caffeinate.update_config(|config| config.timeout_secs = 3);
    caffeinate.start().await.unwrap();
    assert!(!process_exists(first).unwrap(), "preempted helper still alive");

    sleep(Duration::from_secs(2)).await;
    assert!(caffeinate.running(), "not running after three seconds");

    sleep(Duration::from_millis(2500)).await;
    assert!(!caffeinate.running(), "still running after five and a half seconds");

    caffeinate.wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wait_returns_promptly_after_natural_exit() {
    let caffeinate = supervisor("repeat-wait", system_sleep_config(1));

    caffeinate.start().await.unwrap();
    timeout(TEST_TIMEOUT, caffeinate.wait()).await.unwrap().unwrap();

    for _ in 0..3 {
        timeout(Duration::from_millis(100), caffeinate.wait())
            .await
            .expect("wait blocked after the helper exited")
            .unwrap();
    }
    assert_eq!(caffeinate.state(), SupervisorState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_on_idle_supervisor_is_a_noop() {
    let caffeinate = supervisor("idle-stop", system_sleep_config(2));
    caffeinate.stop().await.unwrap();
    assert!(!caffeinate.running());
    assert!(caffeinate.last_outcome().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_kills_a_helper_without_timeout() {
    // no -t: the helper would hold its assertion for as long as this test runs
    let caffeinate = supervisor("forever", system_sleep_config(0));

    caffeinate.start().await.unwrap();
    let pid = caffeinate.managed_pid().unwrap();
    sleep(Duration::from_millis(300)).await;
    assert!(caffeinate.running());

    let result = timeout(TEST_TIMEOUT, caffeinate.stop()).await.unwrap();
    assert_eq!(result, Err(ProcessError::killed("forever", "SIGKILL")));
    assert!(!caffeinate.running());
    assert!(!process_exists(pid).unwrap());
    assert!(caffeinate.last_outcome().unwrap().stop_requested);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_waiters_unblock_on_the_same_exit() {
    let caffeinate = supervisor("waiters", system_sleep_config(1));
    caffeinate.start().await.unwrap();
    let started = Instant::now();

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let caffeinate = caffeinate.clone();
            tokio::spawn(async move {
                caffeinate.wait().await?;
                Ok::<_, ProcessError>(Instant::now())
            })
        })
        .collect();

    let mut released = Vec::new();
    for waiter in waiters {
        released.push(timeout(TEST_TIMEOUT, waiter).await.unwrap().unwrap().unwrap());
    }

    for at in &released {
        assert!(at.duration_since(started) >= Duration::from_millis(900));
    }
    let earliest = released.iter().min().unwrap();
    let latest = released.iter().max().unwrap();
    assert!(latest.duration_since(*earliest) < Duration::from_millis(500));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn helper_exits_when_watched_process_disappears() {
    let mut target = tokio::process::Command::new("sleep").arg("1").spawn().unwrap();
    let target_pid = target.id().unwrap();
    // reap the target so its pid really disappears
    let reaper = tokio::spawn(async move { target.wait().await });

    let caffeinate = supervisor(
        "watch-pid",
        CaffeinateConfig {
            idle_system: true,
            target_pid: Some(target_pid),
            executable: fake_caffeinate_path(),
            ..Default::default()
        },
    );

    caffeinate.start().await.unwrap();
    assert!(caffeinate.running());

    timeout(TEST_TIMEOUT, caffeinate.wait()).await.unwrap().unwrap();
    assert!(!caffeinate.running());
    reaper.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn supervisors_are_independent() {
    let first = supervisor("first", system_sleep_config(0));
    let second = supervisor("second", system_sleep_config(0));

    first.start().await.unwrap();
    second.start().await.unwrap();
    assert_ne!(first.managed_pid(), second.managed_pid());

    assert!(matches!(first.stop().await, Err(ProcessError::Killed { .. })));
    assert!(!first.running());
    assert!(second.running());

    assert!(matches!(second.stop().await, Err(ProcessError::Killed { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn missing_executable_is_reported() {
    let caffeinate = supervisor(
        "missing",
        CaffeinateConfig {
            system: true,
            executable: PathBuf::from("/nonexistent/caffeinate"),
            ..Default::default()
        },
    );

    let err = caffeinate.start().await.unwrap_err();
    assert!(matches!(err, ProcessError::SpawnFailed { ref id, .. } if id == "missing"));
    assert!(!caffeinate.running());
    assert_eq!(caffeinate.state(), SupervisorState::Idle);
}
