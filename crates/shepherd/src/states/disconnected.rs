//! Shown while the peer is unreachable.

use shepherd_core::{Frame, State};

use super::scenery::{centered_sprite, centered_text, draw_grass, sprites};
use super::{Ctx, RanchArgs, RanchSnapshot};
use crate::game::SheepColor;

/// Static "disconnected" screen. The machine parks the interrupted state
/// and returns to it on recovery; this state holds nothing of its own.
pub struct DisconnectedState {
    color: SheepColor,
}

impl DisconnectedState {
    /// Creates the screen for the player catching `color`.
    #[must_use]
    pub const fn new(color: SheepColor) -> Self {
        Self { color }
    }
}

impl State<RanchArgs, RanchSnapshot> for DisconnectedState {
    fn render(&mut self, ctx: &mut Ctx<'_>, frame: &mut Frame) {
        let display = *ctx.display();
        draw_grass(frame, &display, true);
        centered_text(frame, &display, "Disconnected", display.height() / 2.0, 24.0);
        centered_text(
            frame,
            &display,
            &format!("Your {} sheep are waiting", self.color.name()),
            display.height() / 2.0 + 32.0 * display.scale_y,
            14.0,
        );
        centered_sprite(frame, &display, sprites::SAD_SHEEP, 128.0);
    }
}
