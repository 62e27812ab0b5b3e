//! # SHEPHERD Core Engine
//!
//! The session engine shared by both peers of a two-player game:
//! - A game state machine with ordered transitions and typed snapshots
//! - A fixed-timestep "catch-up" loop running on a dedicated thread
//! - The thread-safe plumbing between them (input queue, blocking deque,
//!   one-shot connection signals, double-buffered frame surface)
//!
//! ## Threading Rules
//!
//! 1. **The simulation thread owns the state machine** - transitions, updates
//!    and renders never interleave
//! 2. **Cross-thread traffic goes through queues and flags** - no other
//!    shared mutable state
//! 3. **Connection signals are sampled once per fixed step** - never during
//!    rendering
//!
//! ## Example
//!
//! ```rust,ignore
//! use shepherd_core::{GameLoop, LoopConfig, StateMachine};
//!
//! let mut machine = StateMachine::new(port, display);
//! machine.register(StateId::INITIAL, WaitingState::new());
//! machine.start(None);
//!
//! let mut game_loop = GameLoop::new(machine, &LoopConfig::default(), signals, surface);
//! game_loop.resume();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod game_loop;
pub mod input;
pub mod port;
pub mod render;
pub mod state;
pub mod sync;

pub use config::{DisplayContext, LoopConfig};
pub use error::{CoreError, CoreResult, SnapshotError};
pub use game_loop::{FixedStep, GameLoop, LoopStats, Simulation};
pub use input::{InputEvent, InputKind, InputQueue, InputReceiver, InputSender};
pub use port::{ChannelPort, MessagePort};
pub use render::{Color, DrawCommand, Frame, SpriteId};
pub use state::{
    Entry, SavedSession, State, StateContext, StateId, StateMachine, StateWatch, Transition,
};
pub use sync::{BlockingDeque, ConnectionSignals, FrameSurface, SwapSurface};

/// Default simulation rate (fixed steps per second).
pub const DEFAULT_TARGET_FPS: u32 = 60;

/// Logical portrait width that game coordinates are authored against.
pub const LOGICAL_WIDTH: u32 = 320;

/// Logical portrait height that game coordinates are authored against.
pub const LOGICAL_HEIGHT: u32 = 480;
