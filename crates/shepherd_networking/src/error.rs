//! # Networking Error Types

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::codec::FrameError;

/// Errors raised while connecting or talking to the peer.
#[derive(Error, Debug)]
pub enum NetError {
    /// Underlying socket failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No guest showed up in time.
    #[error("no peer connected within {0:?}")]
    AcceptTimeout(Duration),

    /// The host did not answer in time.
    #[error("could not reach {addr} within {timeout:?}")]
    ConnectTimeout {
        /// Address dialed.
        addr: SocketAddr,
        /// Timeout in force.
        timeout: Duration,
    },

    /// The operation needs a live connection.
    #[error("not connected")]
    NotConnected,

    /// Workers of a previous connection are still running.
    #[error("transport is already communicating")]
    AlreadyCommunicating,

    /// A frame could not be encoded or decoded.
    #[error("framing error: {0}")]
    Frame(#[from] FrameError),

    /// Every reconnection attempt failed.
    #[error("reconnection failed after {attempts} attempts")]
    ReconnectExhausted {
        /// Attempts made.
        attempts: u32,
    },
}

/// Result type for networking operations.
pub type NetResult<T> = Result<T, NetError>;
