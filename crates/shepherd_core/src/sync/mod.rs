//! # Synchronization Primitives
//!
//! The only channels through which threads talk to each other.
//!
//! ## The Problem
//!
//! ```text
//! UI thread:          submits input, pauses/resumes, saves state
//! Simulation thread:  owns the state machine, updates and renders
//! Send worker:        writes frames to the socket
//! Receive worker:     reads frames, notices the peer going away
//! ```
//!
//! ## The Solution
//!
//! ```text
//! messages       -> BlockingDeque (sentinel-terminated)
//! lost/recovered -> ConnectionSignals (coalescing one-shot flags)
//! frames         -> SwapSurface (double-buffered, never blocks)
//! ```
//!
//! Gameplay data never crosses a thread boundary.

mod deque;
mod signal;
mod surface;

pub use deque::BlockingDeque;
pub use signal::ConnectionSignals;
pub use surface::{FrameSurface, SwapSurface};
