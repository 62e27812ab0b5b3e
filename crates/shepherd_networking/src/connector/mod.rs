//! # Connectors
//!
//! Produce the one TCP stream a session runs on.
//!
//! ```text
//! discovery ──► PeerInfo { peer_address, is_group_owner }
//!                          │
//!            ┌─────────────┴─────────────┐
//!      group owner                   other peer
//!            ▼                           ▼
//!    HostConnector                GuestConnector
//!    bind 0.0.0.0:port            dial peer_address:port
//!    accept one stream            connect with timeout
//! ```
//!
//! The group owner always hosts and is the game master: it generates the
//! game setup and decides whether to play again.

mod guest;
mod host;
mod reconnect;

pub use guest::GuestConnector;
pub use host::HostConnector;
pub use reconnect::{reconnect, ReconnectPolicy};

use std::fmt;
use std::net::{IpAddr, TcpStream};

use crate::config::NetConfig;
use crate::error::NetResult;

/// What peer discovery tells us about the other device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerInfo {
    /// Address of the other peer (for the host: its own group address).
    pub peer_address: IpAddr,
    /// True on the device that owns the peer-to-peer group.
    pub is_group_owner: bool,
}

/// Which side of the session this peer plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Listens, generates the setup, decides rematches.
    Host,
    /// Dials the host and follows its lead.
    Guest,
}

impl Role {
    /// The role discovery assigns to this device.
    #[must_use]
    pub const fn from_peer(peer: &PeerInfo) -> Self {
        if peer.is_group_owner {
            Self::Host
        } else {
            Self::Guest
        }
    }

    /// Returns true for the host.
    #[inline]
    #[must_use]
    pub const fn is_game_master(self) -> bool {
        matches!(self, Self::Host)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

/// Establishes the session stream.
pub trait Connector: Send {
    /// Blocks until a stream is established or the attempt fails.
    ///
    /// On failure the connector stays disconnected and may be retried.
    ///
    /// # Errors
    ///
    /// Returns the reason the attempt failed (timeout, refusal, I/O).
    fn connect(&mut self) -> NetResult<TcpStream>;

    /// Releases listening resources and closes the active stream. Safe to
    /// call when not connected.
    fn disconnect(&mut self);

    /// Returns true after a successful [`Connector::connect`] and until
    /// [`Connector::disconnect`].
    fn is_connected(&self) -> bool;

    /// This peer's role, fixed at construction.
    fn role(&self) -> Role;

    /// Returns true on the host.
    fn is_game_master(&self) -> bool {
        self.role().is_game_master()
    }
}

/// Picks the connector matching this peer's role.
#[must_use]
pub fn connector_for(peer: &PeerInfo, config: &NetConfig) -> Box<dyn Connector> {
    match Role::from_peer(peer) {
        Role::Host => Box::new(HostConnector::new(config)),
        Role::Guest => Box::new(GuestConnector::new(peer.peer_address, config)),
    }
}
