//! # Game States
//!
//! ```text
//!   host:  HostWaiting ──setup sent──┐
//!                                    ├──> Synchronizing ──start time──> Playing ──winner──> GameOver
//!   guest: GuestWaiting ─setup recv──┘
//!
//!   any state ──connection lost──> Disconnected ──recovered──> parked state
//! ```
//!
//! States talk to the peer only through the machine: they queue payloads in
//! an outbox drained by `produce_outgoing_network_message`, and receive
//! payloads in `read_network_message` while they accept them.

mod disconnected;
mod game_over;
mod playing;
mod scenery;
mod synchronizing;
mod waiting;

pub use disconnected::DisconnectedState;
pub use game_over::GameOverState;
pub use playing::PlayingState;
pub use scenery::sprites;
pub use synchronizing::SynchronizingState;
pub use waiting::{GuestWaitingState, HostWaitingState};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shepherd_core::{State, StateContext, StateId};
use shepherd_networking::Role;

use crate::clock::WallClock;
use crate::game::{Sheep, SheepColor};
use crate::hooks::SessionHooks;
use crate::{GAME_OVER, PLAYING, SYNCHRONIZING};

/// Arguments handed from one state to the next.
#[derive(Clone, Debug, PartialEq)]
pub enum RanchArgs {
    /// A game was announced.
    Countdown {
        /// Shared start instant.
        start_time_ms: i64,
        /// Flock with normalized positions.
        flock: Vec<Sheep>,
    },
    /// Start playing with this flock (normalized positions).
    Flock(Vec<Sheep>),
    /// The game is over.
    Winner(SheepColor),
}

/// Per-state snapshots, saved while suspended or disconnected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RanchSnapshot {
    /// Waiting for the shared start time.
    Countdown {
        /// Shared start instant.
        start_time_ms: i64,
        /// Flock with normalized positions.
        flock: Vec<Sheep>,
    },
    /// Mid-game flock, positions in surface pixels.
    Playing {
        /// Every sheep, caught ones included.
        flock: Vec<Sheep>,
    },
    /// Game decided.
    GameOver {
        /// Winning color.
        winner: SheepColor,
    },
}

/// Everything the states need from the outside world.
#[derive(Clone)]
pub struct RanchDeps {
    /// Which side of the connection this peer is.
    pub role: Role,
    /// Source of wall-clock time for the shared start.
    pub clock: Arc<dyn WallClock>,
    /// Audio and UI callbacks.
    pub hooks: Arc<dyn SessionHooks>,
    /// Delay between the setup packet and the start of play.
    pub countdown: Duration,
    /// Fixed flock seed; `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl RanchDeps {
    /// The color this peer catches.
    #[inline]
    #[must_use]
    pub const fn color(&self) -> SheepColor {
        SheepColor::for_role(self.role)
    }
}

/// Hook context for the game's states.
pub(crate) type Ctx<'a> = StateContext<'a, RanchArgs, RanchSnapshot>;

/// A boxed game state.
pub type BoxedState = Box<dyn State<RanchArgs, RanchSnapshot>>;

/// Builds a fresh set of states for one game.
#[must_use]
pub fn registry(deps: &RanchDeps) -> Vec<(StateId, BoxedState)> {
    let waiting: BoxedState = match deps.role {
        Role::Host => Box::new(HostWaitingState::new(deps.clone())),
        Role::Guest => Box::new(GuestWaitingState::new(deps.clone())),
    };
    vec![
        (StateId::INITIAL, waiting),
        (SYNCHRONIZING, Box::new(SynchronizingState::new(deps.clone()))),
        (PLAYING, Box::new(PlayingState::new(deps.clone()))),
        (GAME_OVER, Box::new(GameOverState::new(deps.clone()))),
        (StateId::DISCONNECTED, Box::new(DisconnectedState::new(deps.color()))),
    ]
}
