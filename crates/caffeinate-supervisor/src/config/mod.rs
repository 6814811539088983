use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod validation;

/// Location of the helper on macOS.
pub const DEFAULT_EXECUTABLE: &str = "/usr/bin/caffeinate";

/// Options for one invocation of the `caffeinate` helper.
///
/// Every field maps to one command-line flag; see [`CaffeinateConfig::to_args`]
/// for the order. All fields are optional in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaffeinateConfig {
    /// `-d`: prevent the display from sleeping.
    pub display: bool,
    /// `-i`: prevent the system from idle sleeping.
    pub idle_system: bool,
    /// `-m`: prevent the disk from idle sleeping.
    pub idle_disk: bool,
    /// `-s`: prevent the system from sleeping. Only honoured on AC power.
    pub system: bool,
    /// `-u`: declare that the user is active. The helper applies a 5 second
    /// timeout when no timeout is given.
    pub user_active: bool,
    /// `-t`: timeout in seconds. Zero means no timeout.
    pub timeout_secs: u64,
    /// `-w`: pid whose lifetime bounds the assertion. `None` (or `Some(0)`)
    /// means the calling process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_pid: Option<u32>,
    /// Helper executable.
    pub executable: PathBuf,
}

impl Default for CaffeinateConfig {
    fn default() -> Self {
        Self {
            display: false,
            idle_system: false,
            idle_disk: false,
            system: false,
            user_active: false,
            timeout_secs: 0,
            target_pid: None,
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
        }
    }
}

impl CaffeinateConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: CaffeinateConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// The pid passed to `-w`, resolving "unset" to `own_pid`.
    pub fn effective_target_pid(&self, own_pid: u32) -> u32 {
        match self.target_pid {
            Some(pid) if pid > 0 => pid,
            _ => own_pid,
        }
    }

    /// Argument list for the helper, waiting on the calling process by default.
    pub fn to_args(&self) -> Vec<String> {
        self.to_args_for(std::process::id())
    }

    /// Argument list for the helper.
    ///
    /// Order is fixed: `-d -i -m -s -u`, then `-t <secs>` when the timeout is
    /// positive, then always `-w <pid>`.
    pub fn to_args_for(&self, own_pid: u32) -> Vec<String> {
        let mut args = Vec::with_capacity(9);

        let flags = [
            (self.display, "-d"),
            (self.idle_system, "-i"),
            (self.idle_disk, "-m"),
            (self.system, "-s"),
            (self.user_active, "-u"),
        ];
        args.extend(
            flags
                .iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| flag.to_string()),
        );

        if self.timeout_secs > 0 {
            args.push("-t".to_string());
            args.push(self.timeout_secs.to_string());
        }

        args.push("-w".to_string());
        args.push(self.effective_target_pid(own_pid).to_string());

        args
    }
}
