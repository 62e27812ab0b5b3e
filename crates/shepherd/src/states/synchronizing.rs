//! Countdown to the shared start time.

use shepherd_core::{Entry, Frame, State, StateId};

use super::scenery::{centered_sprite, centered_text, draw_grass, sheep_sprite};
use super::{Ctx, RanchArgs, RanchDeps, RanchSnapshot};
use crate::game::Sheep;
use crate::PLAYING;

/// Both peers sit here until the host's announced start time; the flock is
/// then handed to the playing state.
pub struct SynchronizingState {
    deps: RanchDeps,
    start_time_ms: i64,
    flock: Vec<Sheep>,
}

impl SynchronizingState {
    /// Creates the state.
    #[must_use]
    pub const fn new(deps: RanchDeps) -> Self {
        Self {
            deps,
            start_time_ms: 0,
            flock: Vec::new(),
        }
    }

    /// Whole seconds left before play starts, rounded up.
    ///
    /// The start time comes from the peer and may be any `i64`.
    #[must_use]
    pub fn seconds_left(&self) -> i64 {
        let remaining = self.start_time_ms.saturating_sub(self.deps.clock.now_ms());
        remaining.max(0).saturating_add(999) / 1000
    }
}

impl State<RanchArgs, RanchSnapshot> for SynchronizingState {
    fn on_state_start(&mut self, ctx: &mut Ctx<'_>, entry: Entry<RanchArgs, RanchSnapshot>) {
        let countdown = match entry {
            Entry::Switch {
                args: Some(RanchArgs::Countdown {
                    start_time_ms,
                    flock,
                }),
                ..
            } => Some((start_time_ms, flock)),
            other => match other.into_snapshot() {
                Some(RanchSnapshot::Countdown {
                    start_time_ms,
                    flock,
                }) => Some((start_time_ms, flock)),
                _ => None,
            },
        };

        match countdown {
            Some((start_time_ms, flock)) => {
                self.start_time_ms = start_time_ms;
                self.flock = flock;
                tracing::debug!("Counting down {} s", self.seconds_left());
            }
            None => {
                tracing::warn!("Countdown entered without a game, back to waiting");
                ctx.switch_to(StateId::INITIAL);
            }
        }
    }

    fn on_state_save(&self) -> Option<RanchSnapshot> {
        Some(RanchSnapshot::Countdown {
            start_time_ms: self.start_time_ms,
            flock: self.flock.clone(),
        })
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, _dt: f32) {
        if self.deps.clock.now_ms() >= self.start_time_ms {
            ctx.switch_with(PLAYING, RanchArgs::Flock(std::mem::take(&mut self.flock)));
        }
    }

    fn render(&mut self, ctx: &mut Ctx<'_>, frame: &mut Frame) {
        let display = *ctx.display();
        let color = self.deps.color();
        draw_grass(frame, &display, true);
        centered_text(
            frame,
            &display,
            &format!("Starting in {}", self.seconds_left()),
            display.height() / 2.0 - 32.0 * display.scale_y,
            20.0,
        );
        centered_text(
            frame,
            &display,
            &format!("Catch the {} sheep!", color.name()),
            display.height() / 2.0,
            20.0,
        );
        centered_sprite(frame, &display, sheep_sprite(color), 128.0);
    }
}
