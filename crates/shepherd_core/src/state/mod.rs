//! # Game States
//!
//! A game is a closed set of states (waiting, countdown, playing,
//! disconnected, game over...) of which exactly one is active.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 StateMachine                 │
//! │                                              │
//! │  registry: StateId -> Box<dyn State>         │
//! │  current:  StateId                           │
//! │  port:     Arc<dyn MessagePort>              │
//! └──────┬───────────────────────────────┬───────┘
//!        │ hook(ctx, ..)                 │ ctx.switch_to(..)
//!        ▼                               │
//! ┌──────────────┐   request transition  │
//! │ active State │───────────────────────┘
//! └──────────────┘
//! ```
//!
//! States never hold the machine. They request transitions through the
//! [`StateContext`] passed to every hook; the machine applies the request as
//! soon as the hook returns, which keeps the end → switch → start ordering
//! intact.
//!
//! `A` is the game's transition-argument type, `S` its snapshot type.

mod machine;
mod snapshot;

pub use machine::StateMachine;
pub use snapshot::SavedSession;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::DisplayContext;
use crate::input::InputEvent;
use crate::render::Frame;

/// Identifier of a registered state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u32);

impl StateId {
    /// The state a fresh session starts in.
    pub const INITIAL: Self = Self(0);

    /// The state shown while the peer is unreachable.
    pub const DISCONNECTED: Self = Self(u32::MAX);
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INITIAL => write!(f, "initial"),
            Self::DISCONNECTED => write!(f, "disconnected"),
            Self(id) => write!(f, "#{id}"),
        }
    }
}

/// Read-only view of the active state id, shared with other threads.
///
/// The machine publishes every change; readers never block the loop.
#[derive(Clone, Debug)]
pub struct StateWatch(Arc<AtomicU64>);

impl StateWatch {
    /// Published before the machine starts.
    const NONE: u64 = u64::MAX;

    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU64::new(Self::NONE)))
    }

    pub(crate) fn publish(&self, id: Option<StateId>) {
        let raw = id.map_or(Self::NONE, |StateId(id)| u64::from(id));
        self.0.store(raw, Ordering::Release);
    }

    /// The active state id, `None` before the machine starts.
    #[must_use]
    pub fn get(&self) -> Option<StateId> {
        match self.0.load(Ordering::Acquire) {
            Self::NONE => None,
            #[allow(clippy::cast_possible_truncation)]
            raw => Some(StateId(raw as u32)),
        }
    }
}

/// How a state was entered.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry<A, S> {
    /// First state of a freshly started machine, optionally restoring a
    /// snapshot saved by an earlier process.
    Start {
        /// Snapshot to rebuild from.
        snapshot: Option<S>,
    },
    /// Regular transition.
    Switch {
        /// Arguments handed over by the previous state.
        args: Option<A>,
        /// Snapshot to rebuild from (connection recovery).
        snapshot: Option<S>,
    },
    /// New game in the same session.
    Restart,
}

impl<A, S> Entry<A, S> {
    /// Takes the snapshot out of the entry, if any.
    #[must_use]
    pub fn into_snapshot(self) -> Option<S> {
        match self {
            Self::Start { snapshot } | Self::Switch { snapshot, .. } => snapshot,
            Self::Restart => None,
        }
    }
}

/// A transition requested by a state.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition<A, S> {
    /// Target state.
    pub target: StateId,
    /// Arguments for the target's start hook.
    pub args: Option<A>,
    /// Snapshot for the target's start hook.
    pub snapshot: Option<S>,
}

/// Per-call context handed to state hooks.
pub struct StateContext<'a, A, S> {
    state: StateId,
    display: &'a DisplayContext,
    transition: Option<Transition<A, S>>,
}

impl<'a, A, S> StateContext<'a, A, S> {
    /// Creates a context for the hooks of `state`.
    #[must_use]
    pub const fn new(state: StateId, display: &'a DisplayContext) -> Self {
        Self {
            state,
            display,
            transition: None,
        }
    }

    /// The state whose hook is running.
    #[inline]
    #[must_use]
    pub const fn state_id(&self) -> StateId {
        self.state
    }

    /// Screen geometry.
    #[inline]
    #[must_use]
    pub const fn display(&self) -> &DisplayContext {
        self.display
    }

    /// Requests a switch to `target` once the hook returns.
    pub fn switch_to(&mut self, target: StateId) {
        self.request(Transition {
            target,
            args: None,
            snapshot: None,
        });
    }

    /// Requests a switch to `target`, handing it `args`.
    pub fn switch_with(&mut self, target: StateId, args: A) {
        self.request(Transition {
            target,
            args: Some(args),
            snapshot: None,
        });
    }

    /// Requests an arbitrary transition. A later request replaces an earlier
    /// one made during the same hook.
    pub fn request(&mut self, transition: Transition<A, S>) {
        if let Some(previous) = &self.transition {
            tracing::debug!(
                "State {} replaced pending transition to {} with {}",
                self.state,
                previous.target,
                transition.target
            );
        }
        self.transition = Some(transition);
    }

    /// Returns true if the hook asked for a transition.
    #[must_use]
    pub const fn has_pending_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// Consumes the context, yielding the requested transition.
    #[must_use]
    pub fn into_transition(self) -> Option<Transition<A, S>> {
        self.transition
    }
}

/// The hooks every game state may implement.
///
/// All hooks default to no-ops; states implement only what they need. Every
/// hook runs on the simulation thread.
pub trait State<A, S>: Send {
    /// The state became active.
    fn on_state_start(&mut self, ctx: &mut StateContext<'_, A, S>, entry: Entry<A, S>) {
        let _ = (ctx, entry);
    }

    /// Captures enough data to rebuild this state later.
    fn on_state_save(&self) -> Option<S> {
        None
    }

    /// The state is about to be replaced.
    fn on_state_end(&mut self) {}

    /// A pointer event reached the active state.
    fn read_input_event(&mut self, ctx: &mut StateContext<'_, A, S>, event: InputEvent) {
        let _ = (ctx, event);
    }

    /// Advances the state by `dt` seconds.
    fn update(&mut self, ctx: &mut StateContext<'_, A, S>, dt: f32) {
        let _ = (ctx, dt);
    }

    /// Records the state's visuals.
    fn render(&mut self, ctx: &mut StateContext<'_, A, S>, frame: &mut Frame) {
        let _ = (ctx, frame);
    }

    /// Whether the machine should feed incoming peer messages to this state.
    ///
    /// States that return `false` leave messages queued for whoever reads the
    /// transport directly (e.g. the post-game decision).
    fn accepts_network_messages(&self) -> bool {
        false
    }

    /// A payload arrived from the peer.
    fn read_network_message(&mut self, ctx: &mut StateContext<'_, A, S>, payload: &[u8]) {
        let _ = (ctx, payload);
    }

    /// Yields the next payload to send to the peer, if any.
    ///
    /// The machine calls this after every hook until it returns `None`.
    fn produce_outgoing_network_message(&mut self) -> Option<Vec<u8>> {
        None
    }
}
