//! # Core Error Types
//!
//! Recoverable errors raised by the core engine.
//!
//! Wiring mistakes (switching to an unregistered state, starting the machine
//! twice) are not represented here: they panic, because they can only be
//! fixed by changing the code.

use thiserror::Error;

/// Errors that can occur while configuring the core engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while encoding or decoding a session snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The snapshot bytes are not a valid session envelope.
    #[error("malformed session snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The snapshot bytes were empty.
    #[error("session snapshot is empty")]
    Empty,
}
