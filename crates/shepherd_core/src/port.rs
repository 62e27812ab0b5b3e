//! # Message Port
//!
//! The seam between the state machine and whatever moves bytes to the peer.
//! The networking crate implements it for its TCP transport; [`ChannelPort`]
//! wires two machines together in memory.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// A bidirectional, ordered pipe of opaque payloads.
pub trait MessagePort: Send + Sync {
    /// Returns the next received payload, if any. Never blocks.
    fn poll_incoming(&self) -> Option<Vec<u8>>;

    /// Queues a payload for the peer. Never blocks; delivery is best-effort.
    fn post(&self, payload: Vec<u8>);
}

/// In-memory port; payloads posted on one end are polled on the other.
pub struct ChannelPort {
    outgoing: Sender<Vec<u8>>,
    incoming: Receiver<Vec<u8>>,
}

impl ChannelPort {
    /// Creates two connected ends.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = unbounded();
        let (b_tx, b_rx) = unbounded();
        (
            Self {
                outgoing: a_tx,
                incoming: b_rx,
            },
            Self {
                outgoing: b_tx,
                incoming: a_rx,
            },
        )
    }

    /// Creates an end whose peer is gone: posts are discarded and nothing
    /// ever arrives.
    #[must_use]
    pub fn detached() -> Self {
        Self::pair().0
    }

    /// Returns the number of payloads waiting to be polled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }
}

impl MessagePort for ChannelPort {
    fn poll_incoming(&self) -> Option<Vec<u8>> {
        self.incoming.try_recv().ok()
    }

    fn post(&self, payload: Vec<u8>) {
        // A dropped peer behaves like a dead link: the payload is lost.
        let _ = self.outgoing.send(payload);
    }
}
