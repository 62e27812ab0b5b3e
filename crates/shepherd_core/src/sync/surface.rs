//! # Double-Buffered Frame Surface
//!
//! The game loop records into the back buffer while the UI thread reads the
//! front buffer.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌─────────────────────────────┐
//!                    │         SwapSurface         │
//!                    │                             │
//!                    │  ┌─────────┐  ┌─────────┐  │
//!                    │  │  Back   │  │  Front  │  │
//!                    │  └────┬────┘  └────┬────┘  │
//!                    └───────┼────────────┼───────┘
//!                            │            │
//!                ┌───────────┴──┐   ┌─────┴────────┐
//!                │ acquire()    │   │ read_front() │
//!                │ present()    │   │ (UI thread)  │
//!                │ (loop thread)│   └──────────────┘
//!                └──────────────┘
//! ```
//!
//! - `acquire()` hands out the back buffer, or `None` while the surface is
//!   unavailable or the back buffer is already out
//! - `present()` swaps the recorded frame to the front

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::render::Frame;

/// Render target the game loop draws into once per iteration.
///
/// Acquisition may fail (surface not ready, previous frame still out), in
/// which case the loop skips rendering for that iteration.
pub trait FrameSurface: Send + Sync {
    /// Borrows a blank frame to record into.
    fn acquire(&self) -> Option<Frame>;

    /// Publishes a recorded frame.
    fn present(&self, frame: Frame);
}

/// Double-buffered frame surface.
#[derive(Debug)]
pub struct SwapSurface {
    /// Back buffer. `None` while the loop holds it.
    back: Mutex<Option<Frame>>,
    /// Most recently presented frame.
    front: Mutex<Frame>,
    /// Whether frames may be acquired at all.
    available: AtomicBool,
    /// Number of presented frames.
    frame_count: AtomicU64,
}

impl SwapSurface {
    /// Creates an available surface with two blank buffers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            back: Mutex::new(Some(Frame::new())),
            front: Mutex::new(Frame::new()),
            available: AtomicBool::new(true),
            frame_count: AtomicU64::new(0),
        }
    }

    /// Marks the surface as (un)available, e.g. while the window is hidden.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Returns whether frames can currently be acquired.
    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Returns the number of frames presented so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Runs `read` against the front buffer.
    pub fn read_front<R>(&self, read: impl FnOnce(&Frame) -> R) -> R {
        read(&self.front.lock())
    }

    /// Returns a copy of the front buffer.
    #[must_use]
    pub fn front_snapshot(&self) -> Frame {
        self.front.lock().clone()
    }
}

impl Default for SwapSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSurface for SwapSurface {
    fn acquire(&self) -> Option<Frame> {
        if !self.is_available() {
            return None;
        }
        let mut frame = self.back.lock().take()?;
        frame.reset(self.frame_count() + 1);
        Some(frame)
    }

    fn present(&self, mut frame: Frame) {
        {
            let mut front = self.front.lock();
            std::mem::swap(&mut *front, &mut frame);
        }
        // The previous front becomes the next back buffer.
        *self.back.lock() = Some(frame);
        self.frame_count.fetch_add(1, Ordering::Relaxed);
    }
}
