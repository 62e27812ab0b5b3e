//! Win/lose screen.

use shepherd_core::{Entry, Frame, State, StateId};

use super::scenery::{centered_sprite, centered_text, draw_grass, sheep_sprite};
use super::{Ctx, RanchArgs, RanchDeps, RanchSnapshot};
use crate::game::SheepColor;
use crate::hooks::SoundCue;

/// Announces the result, plays the matching cue and tells the application
/// the game ended. What happens next is decided outside the loop.
pub struct GameOverState {
    deps: RanchDeps,
    winner: Option<SheepColor>,
}

impl GameOverState {
    /// Creates the state.
    #[must_use]
    pub const fn new(deps: RanchDeps) -> Self {
        Self { deps, winner: None }
    }

    /// True if this peer won.
    #[must_use]
    pub fn has_won(&self) -> bool {
        self.winner == Some(self.deps.color())
    }
}

impl State<RanchArgs, RanchSnapshot> for GameOverState {
    fn on_state_start(&mut self, ctx: &mut Ctx<'_>, entry: Entry<RanchArgs, RanchSnapshot>) {
        self.winner = match entry {
            Entry::Switch {
                args: Some(RanchArgs::Winner(winner)),
                ..
            } => Some(winner),
            other => match other.into_snapshot() {
                Some(RanchSnapshot::GameOver { winner }) => Some(winner),
                _ => None,
            },
        };

        let Some(winner) = self.winner else {
            tracing::warn!("Game over without a winner, back to waiting");
            ctx.switch_to(StateId::INITIAL);
            return;
        };

        let won = self.has_won();
        tracing::info!("Game over, the {} player won ({})", winner.name(), if won { "us" } else { "peer" });
        self.deps
            .hooks
            .play_sound(if won { SoundCue::Win } else { SoundCue::Lose });
        self.deps.hooks.game_ended();
    }

    fn on_state_save(&self) -> Option<RanchSnapshot> {
        self.winner.map(|winner| RanchSnapshot::GameOver { winner })
    }

    fn on_state_end(&mut self) {
        self.deps.hooks.release(SoundCue::BackgroundMusic);
    }

    fn render(&mut self, ctx: &mut Ctx<'_>, frame: &mut Frame) {
        let display = *ctx.display();
        draw_grass(frame, &display, true);
        let message = if self.has_won() { "You won!" } else { "You lose!" };
        centered_text(frame, &display, message, display.height() / 2.0, 32.0);
        if let Some(winner) = self.winner {
            centered_sprite(frame, &display, sheep_sprite(winner), 128.0);
        }
    }
}
