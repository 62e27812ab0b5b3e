//! # SHEPHERD Networking
//!
//! The link between the two peers of a session: one TCP stream carrying
//! length-prefixed messages in both directions.
//!
//! ## Architecture
//!
//! ```text
//!   game thread                 worker threads                 peer
//! ┌─────────────┐  outgoing   ┌─────────────┐   [len][bytes]
//! │  send(msg)  │────deque───►│  send loop  │──────────────────►
//! │             │             └─────────────┘
//! │  receive()  │  incoming   ┌─────────────┐   [len][bytes]
//! │             │◄───deque────│ receive loop│◄──────────────────
//! └─────────────┘             └──────┬──────┘
//!                                    │ EOF / I/O error
//!                                    ▼
//!                          connection-lost signal
//! ```
//!
//! - A [`Connector`] produces the stream: the host accepts, the guest dials
//! - The [`Transport`] owns the stream once communication begins
//! - A `None` payload is the shutdown sentinel; it is never written
//!
//! ## Example
//!
//! ```rust,ignore
//! use shepherd_networking::{connector_for, Message, NetConfig, PeerInfo, Transport};
//!
//! let mut connector = connector_for(peer, &NetConfig::default());
//! let stream = connector.connect()?;
//!
//! let transport = Transport::new(signals, NetConfig::default());
//! transport.begin_communication(stream)?;
//! transport.send(Message::new(b"hello".to_vec()));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod codec;
pub mod config;
pub mod connector;
pub mod error;
pub mod message;
pub mod transport;

pub use codec::{encode_frame, encode_frame_into, FrameDecoder, FrameError, LENGTH_PREFIX_SIZE, MAX_MESSAGE_SIZE};
pub use config::NetConfig;
pub use connector::{
    connector_for, reconnect, Connector, GuestConnector, HostConnector, PeerInfo, ReconnectPolicy, Role,
};
pub use error::{NetError, NetResult};
pub use message::Message;
pub use transport::{Transport, TransportStats};

/// Default TCP port of the host.
pub const DEFAULT_PORT: u16 = 53127;
