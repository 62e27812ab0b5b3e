//! # SHEPHERD - Ranch the Sheep
//!
//! A two-player real-time game built on the session engine. Both devices
//! see the same flock; the host catches the white sheep, the guest the dark
//! ones, by dragging a selection rectangle around them. A selection that
//! encloses a sheep of the wrong color catches nothing. First to catch half
//! of the flock wins.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                           Session                             │
//! │                                                               │
//! │  Connector ──stream──> Transport ──MessagePort──┐             │
//! │                           │                     ▼             │
//! │                     ConnectionSignals ──> GameLoop<RanchMachine>
//! │                                                 │             │
//! │                                     ┌───────────┴─────────┐   │
//! │                                     │ waiting → countdown │   │
//! │                                     │ → playing → game    │   │
//! │                                     │ over / disconnected │   │
//! │                                     └─────────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: the game sub-protocol carried inside transport messages
//! - [`game`]: sheep, selections and the catch animation
//! - [`states`]: the game states registered with the state machine
//! - [`session`]: wiring, pause/resume, save/restore, rematch
//! - [`hooks`]: audio and UI callbacks supplied by the embedding application

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod hooks;
pub mod protocol;
pub mod session;
pub mod states;

pub use clock::{ManualClock, SystemClock, WallClock};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use game::{Poof, Selection, Sheep, SheepColor, Vec2};
pub use hooks::{SessionHooks, SilentHooks, SoundCue};
pub use protocol::{HostDecision, PlayPacket, ProtocolError, SetupPacket};
pub use session::Session;
pub use states::{RanchArgs, RanchDeps, RanchSnapshot};

use shepherd_core::{StateId, StateMachine};

/// Number of sheep in a flock, half of each color.
pub const MAX_SHEEP: usize = 6;

/// Slowest sheep speed, in surface pixels per second.
pub const MIN_SHEEP_SPEED: f32 = 300.0;

/// Fastest sheep speed, in surface pixels per second.
pub const MAX_SHEEP_SPEED: f32 = 450.0;

/// Side of a sheep sprite in logical units.
pub const SHEEP_SIZE: f32 = 48.0;

/// Minimum pointer travel, in pixels, before a drag is mirrored to the peer.
pub const SELECTION_TOLERANCE: f32 = 4.0;

/// The catch-the-sheep state.
pub const PLAYING: StateId = StateId(1);

/// Win/lose screen.
pub const GAME_OVER: StateId = StateId(2);

/// Countdown to the shared start time.
pub const SYNCHRONIZING: StateId = StateId(3);

/// The state machine specialized for this game.
pub type RanchMachine = StateMachine<RanchArgs, RanchSnapshot>;
