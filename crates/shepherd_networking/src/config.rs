//! # Network Configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

use crate::codec::MAX_MESSAGE_SIZE;
use crate::DEFAULT_PORT;

/// Link settings shared by both peers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// TCP port the host listens on and the guest dials.
    pub port: u16,
    /// Address the host binds to.
    pub bind_address: IpAddr,
    /// How long the host waits for the guest.
    pub accept_timeout_ms: u64,
    /// How long the guest waits for the host to answer.
    pub connect_timeout_ms: u64,
    /// Socket write timeout for the send worker (0 disables it).
    pub write_timeout_ms: u64,
    /// Scratch buffer size of the receive worker.
    pub read_buffer_size: usize,
    /// Largest accepted payload.
    pub max_message_size: u32,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            accept_timeout_ms: 5000,
            connect_timeout_ms: 5000,
            write_timeout_ms: 5000,
            read_buffer_size: 8192,
            max_message_size: MAX_MESSAGE_SIZE,
        }
    }
}

impl NetConfig {
    /// Listening address of the host.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Accept timeout.
    #[must_use]
    pub const fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    /// Connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Write timeout, `None` when disabled.
    #[must_use]
    pub const fn write_timeout(&self) -> Option<Duration> {
        if self.write_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.write_timeout_ms))
        }
    }

    /// Returns a copy listening on / dialing `port`.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}
