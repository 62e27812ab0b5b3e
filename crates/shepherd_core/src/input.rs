//! # Input Queue
//!
//! Touch/pointer events travel from the UI thread to the simulation thread
//! over a bounded channel.
//!
//! ```text
//! ┌─────────────┐  submit()  ┌─────────────┐  drain()  ┌──────────────┐
//! │  UI thread  │───────────>│   bounded   │──────────>│  loop thread │
//! │ (producer)  │  try_send  │   channel   │  try_recv │  (consumer)  │
//! └─────────────┘            └─────────────┘           └──────────────┘
//! ```
//!
//! Submitting never blocks. When the queue is full, or the loop is paused,
//! the event is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Phase of a pointer gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Finger/pointer pressed.
    Down,
    /// Finger/pointer moved while pressed.
    Move,
    /// Finger/pointer released.
    Up,
}

/// A pointer event in surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    /// Gesture phase.
    pub kind: InputKind,
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl InputEvent {
    /// Pointer pressed at `(x, y)`.
    #[must_use]
    pub const fn down(x: f32, y: f32) -> Self {
        Self { kind: InputKind::Down, x, y }
    }

    /// Pointer dragged to `(x, y)`.
    #[must_use]
    pub const fn moved(x: f32, y: f32) -> Self {
        Self { kind: InputKind::Move, x, y }
    }

    /// Pointer released at `(x, y)`.
    #[must_use]
    pub const fn up(x: f32, y: f32) -> Self {
        Self { kind: InputKind::Up, x, y }
    }
}

/// Bounded input channel with an open/closed gate.
pub struct InputQueue {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    open: Arc<AtomicBool>,
}

impl InputQueue {
    /// Creates a queue holding at most `capacity` pending events.
    ///
    /// The queue starts closed; the game loop opens it on resume.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a producer handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
            open: Arc::clone(&self.open),
        }
    }

    /// Creates the consumer handle.
    #[must_use]
    pub fn receiver(&self) -> InputReceiver {
        InputReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Starts or stops accepting events.
    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Release);
    }

    /// Returns whether events are currently accepted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

/// Handle for submitting input events.
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputEvent>,
    open: Arc<AtomicBool>,
}

impl InputSender {
    /// Submits an event (non-blocking).
    ///
    /// Returns `false` if the event was dropped because the loop is paused or
    /// the queue is full.
    #[inline]
    pub fn submit(&self, event: InputEvent) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Input queue full, dropping {:?}", event.kind);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for consuming input events.
#[derive(Clone)]
pub struct InputReceiver {
    receiver: Receiver<InputEvent>,
}

impl InputReceiver {
    /// Feeds every pending event to `dispatch`, in submission order.
    ///
    /// Returns the number of events dispatched.
    pub fn drain(&self, mut dispatch: impl FnMut(InputEvent)) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            dispatch(event);
            count += 1;
        }
        count
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}
