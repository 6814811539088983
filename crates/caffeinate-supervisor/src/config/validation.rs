use super::*;
use anyhow::{anyhow, Result};

/// Upper bound on `-t`; anything longer is almost certainly a unit mistake.
pub const MAX_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

/// Validate a helper configuration
pub fn validate_config(config: &CaffeinateConfig) -> Result<()> {
    validate_executable(&config.executable)?;
    validate_timeout(config.timeout_secs)?;
    Ok(())
}

fn validate_executable(executable: &Path) -> Result<()> {
    if executable.as_os_str().is_empty() {
        return Err(anyhow!("Executable path cannot be empty"));
    }
    Ok(())
}

fn validate_timeout(timeout_secs: u64) -> Result<()> {
    if timeout_secs > MAX_TIMEOUT_SECS {
        return Err(anyhow!(
            "Timeout too long (max {} seconds): {}",
            MAX_TIMEOUT_SECS,
            timeout_secs
        ));
    }
    Ok(())
}
