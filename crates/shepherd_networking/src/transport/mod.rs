//! # Transport Layer
//!
//! Ordered, reliable message delivery over one TCP stream.
//!
//! ## Design
//!
//! - Two worker threads per connection: the send loop owns the write side,
//!   the receive loop owns the read side
//! - Unbounded blocking queues between the game and the workers; `send()`
//!   and `receive()` never block
//! - Shutdown is a sentinel message: pushed to the front of the outgoing
//!   queue by [`Transport::disconnect`], to the back by
//!   [`Transport::disconnect_after_flush`]
//! - Only a peer-caused end of the receive loop (EOF, I/O error, corrupt
//!   frame) raises the connection-lost signal
//!
//! ## Shutdown
//!
//! ```text
//! disconnect()               disconnect_after_flush()
//! ┌──────────────────┐       ┌──────────────────────────────┐
//! │ closing = true   │       │ closing = true               │
//! │ push_front(END)  │       │ push_back(END)               │
//! │ shutdown(Both)   │       │ join send loop (flushed)     │
//! │ join both loops  │       │ shutdown(Write), linger      │
//! └──────────────────┘       │ shutdown(Both), join receive │
//!                            └──────────────────────────────┘
//! ```

mod worker;

use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use shepherd_core::{BlockingDeque, ConnectionSignals, MessagePort};

use crate::config::NetConfig;
use crate::error::{NetError, NetResult};
use crate::message::Message;

/// How often the flush variant checks whether the peer closed its side.
const LINGER_POLL: Duration = Duration::from_millis(10);

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Messages written to the stream.
    pub messages_sent: u64,
    /// Messages decoded from the stream.
    pub messages_received: u64,
    /// Bytes written, length prefixes included.
    pub bytes_sent: u64,
    /// Bytes read.
    pub bytes_received: u64,
    /// Failed or dropped writes.
    pub send_errors: u64,
    /// Failed reads and framing errors.
    pub recv_errors: u64,
}

/// Lock-free counters shared with the workers.
#[derive(Debug, Default)]
struct Counters {
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    send_errors: AtomicU64,
    recv_errors: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> TransportStats {
        TransportStats {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }
}

/// One live connection and its workers.
struct Link {
    /// Handle used to shut the socket down; the workers own clones.
    stream: TcpStream,
    /// Set before a local teardown so the receive loop stays quiet.
    closing: Arc<AtomicBool>,
    sender: Option<JoinHandle<()>>,
    receiver: Option<JoinHandle<()>>,
    peer: Option<SocketAddr>,
}

impl Link {
    fn is_alive(&self) -> bool {
        let running = |handle: &Option<JoinHandle<()>>| handle.as_ref().is_some_and(|h| !h.is_finished());
        running(&self.sender) || running(&self.receiver)
    }

    fn join_sender(&mut self) {
        if let Some(handle) = self.sender.take() {
            if handle.join().is_err() {
                tracing::error!("Send loop panicked");
            }
        }
    }

    fn join_receiver(&mut self) {
        if let Some(handle) = self.receiver.take() {
            if handle.join().is_err() {
                tracing::error!("Receive loop panicked");
            }
        }
    }

    /// Waits up to `timeout` for the receive loop to see the peer's EOF.
    fn linger(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while self.receiver.as_ref().is_some_and(|h| !h.is_finished()) && Instant::now() < deadline {
            thread::sleep(LINGER_POLL);
        }
    }
}

/// Message transport between the two peers.
///
/// Create one per session and reuse it across reconnections: after
/// [`Transport::disconnect`] a new stream can be handed to
/// [`Transport::begin_communication`].
pub struct Transport {
    outgoing: Arc<BlockingDeque<Message>>,
    incoming: Arc<BlockingDeque<Message>>,
    signals: Arc<ConnectionSignals>,
    counters: Arc<Counters>,
    config: NetConfig,
    link: Mutex<Option<Link>>,
}

impl Transport {
    /// Creates an idle transport raising `signals` when the peer goes away.
    #[must_use]
    pub fn new(signals: Arc<ConnectionSignals>, config: NetConfig) -> Self {
        Self {
            outgoing: Arc::new(BlockingDeque::new()),
            incoming: Arc::new(BlockingDeque::new()),
            signals,
            counters: Arc::new(Counters::default()),
            config,
            link: Mutex::new(None),
        }
    }

    /// Starts the send and receive loops on `stream`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::AlreadyCommunicating`] while the workers of a
    /// previous stream are alive, and [`NetError::Io`] if the socket cannot
    /// be configured or a worker cannot be spawned.
    pub fn begin_communication(&self, stream: TcpStream) -> NetResult<()> {
        let mut link = self.link.lock();
        if link.as_ref().is_some_and(Link::is_alive) {
            return Err(NetError::AlreadyCommunicating);
        }
        if let Some(mut stale) = link.take() {
            stale.join_sender();
            stale.join_receiver();
        }

        let queued = self.outgoing.len();
        self.outgoing.retain(|message| !message.is_end());
        let purged = queued - self.outgoing.len();
        if purged > 0 {
            tracing::debug!("Purged {} stale end sentinels", purged);
        }

        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        stream.set_write_timeout(self.config.write_timeout())?;
        let peer = stream.peer_addr().ok();
        let closing = Arc::new(AtomicBool::new(false));

        let sender = {
            let stream = stream.try_clone()?;
            let outgoing = Arc::clone(&self.outgoing);
            let counters = Arc::clone(&self.counters);
            thread::Builder::new()
                .name("shepherd-send".into())
                .spawn(move || worker::send_loop(stream, &outgoing, &counters))?
        };

        let receiver = {
            let ctx = worker::ReceiveContext {
                incoming: Arc::clone(&self.incoming),
                outgoing: Arc::clone(&self.outgoing),
                signals: Arc::clone(&self.signals),
                counters: Arc::clone(&self.counters),
                closing: Arc::clone(&closing),
                buffer_size: self.config.read_buffer_size.max(1),
                max_message_size: self.config.max_message_size,
            };
            let spawned = stream.try_clone().and_then(|stream| {
                thread::Builder::new()
                    .name("shepherd-recv".into())
                    .spawn(move || worker::receive_loop(stream, &ctx))
            });
            match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    self.outgoing.push_front(Message::end());
                    if sender.join().is_err() {
                        tracing::error!("Send loop panicked");
                    }
                    return Err(e.into());
                }
            }
        };

        match peer {
            Some(addr) => tracing::info!("Communication started with {}", addr),
            None => tracing::info!("Communication started"),
        }
        *link = Some(Link {
            stream,
            closing,
            sender: Some(sender),
            receiver: Some(receiver),
            peer,
        });
        Ok(())
    }

    /// Queues `message` for the peer. Never blocks.
    ///
    /// Delivery is best-effort: messages queued after a disconnect request
    /// may never be written.
    pub fn send(&self, message: Message) {
        self.outgoing.push_back(message);
    }

    /// Returns the next received message, if any. Never blocks.
    #[must_use]
    pub fn receive(&self) -> Option<Message> {
        self.incoming.try_pop_front()
    }

    /// Waits up to `timeout` for the next received message.
    #[must_use]
    pub fn receive_blocking(&self, timeout: Duration) -> Option<Message> {
        self.incoming.pop_front_timeout(timeout)
    }

    /// Stops both workers right away and closes the stream.
    ///
    /// Queued outgoing messages are dropped. Does not raise the
    /// connection-lost signal. Idempotent.
    pub fn disconnect(&self) {
        let Some(mut link) = self.link.lock().take() else {
            return;
        };
        link.closing.store(true, Ordering::Release);
        self.outgoing.push_front(Message::end());
        // The peer may already be gone.
        let _ = link.stream.shutdown(Shutdown::Both);
        link.join_sender();
        link.join_receiver();
        tracing::info!("Disconnected from {}", describe(link.peer));
    }

    /// Writes every message queued so far, then closes the stream.
    ///
    /// Waits up to the configured write timeout for the peer to close its
    /// side before tearing the socket down. Idempotent.
    pub fn disconnect_after_flush(&self) {
        let Some(mut link) = self.link.lock().take() else {
            return;
        };
        link.closing.store(true, Ordering::Release);
        self.outgoing.push_back(Message::end());
        link.join_sender();

        let _ = link.stream.shutdown(Shutdown::Write);
        link.linger(self.config.write_timeout().unwrap_or(Duration::ZERO));
        let _ = link.stream.shutdown(Shutdown::Both);
        link.join_receiver();
        tracing::info!("Flushed and disconnected from {}", describe(link.peer));
    }

    /// Returns true while a stream is attached and its workers run.
    #[must_use]
    pub fn is_communicating(&self) -> bool {
        self.link.lock().as_ref().is_some_and(Link::is_alive)
    }

    /// Address of the current peer.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.link.lock().as_ref().and_then(|link| link.peer)
    }

    /// Received messages not yet read.
    #[must_use]
    pub fn pending_incoming(&self) -> usize {
        self.incoming.len()
    }

    /// Drops every received message not yet read.
    pub fn clear_incoming(&self) {
        self.incoming.clear();
    }

    /// The signals raised when the peer goes away.
    #[must_use]
    pub fn signals(&self) -> &Arc<ConnectionSignals> {
        &self.signals
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.counters.snapshot()
    }
}

impl MessagePort for Transport {
    fn poll_incoming(&self) -> Option<Vec<u8>> {
        self.receive().and_then(Message::into_payload)
    }

    fn post(&self, payload: Vec<u8>) {
        self.send(Message::new(payload));
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn describe(peer: Option<SocketAddr>) -> String {
    peer.map_or_else(|| "peer".to_owned(), |addr| addr.to_string())
}
