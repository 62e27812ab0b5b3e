//! # Session Error Types

use shepherd_core::{CoreError, SnapshotError};
use shepherd_networking::{NetError, Role};
use thiserror::Error;

/// Errors raised while running a game session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Connecting or talking to the peer failed.
    #[error("network error: {0}")]
    Net(#[from] NetError),

    /// A saved session could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// A configuration value is out of range.
    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    /// The configuration file does not parse.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Reading the configuration file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation needs the game loop to be paused.
    #[error("game loop is running")]
    LoopRunning,

    /// `establish` was already called.
    #[error("session already established")]
    AlreadyEstablished,

    /// The operation belongs to the other side of the session (only the
    /// host decides, only the guest awaits the decision).
    #[error("not available to the {0}")]
    WrongRole(Role),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
