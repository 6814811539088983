//! # Caffeinate Common
//!
//! Error types shared by the caffeinate supervisor crates.
//!
//! Every fallible operation in the workspace returns [`ProcessResult`], so a
//! launch failure, a failed kill and an abnormal helper exit all travel through
//! the same [`ProcessError`] enum.

pub mod errors;

pub use errors::{ProcessError, ProcessResult};
