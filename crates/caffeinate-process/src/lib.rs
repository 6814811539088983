//! # Caffeinate Process
//!
//! Low-level process operations used by the supervisor.
//!
//! This crate provides:
//! - The process-exec interface ([`ProcessLauncher`], [`ProcessHandle`]) and
//!   its tokio-backed implementation ([`CommandLauncher`])
//! - Process existence verification ([`process_exists`])

pub mod check;
pub mod execute;

pub use check::*;
pub use execute::*;
