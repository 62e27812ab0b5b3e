//! The puff of smoke left by a caught sheep.

use super::Vec2;

/// Sprite sheet columns.
const CELLS_X: u16 = 5;
/// Sprite sheet rows.
const CELLS_Y: u16 = 5;
/// Updates spent on each cell (60 FPS / 8).
const UPDATES_PER_CELL: u32 = 7;

/// A one-shot 5x5 sprite-sheet animation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Poof {
    position: Vec2,
    cell: u16,
    counter: u32,
    visible: bool,
}

impl Poof {
    /// Restarts the animation at `position`.
    pub fn play_at(&mut self, position: Vec2) {
        self.position = position;
        self.cell = 0;
        self.counter = 0;
        self.visible = true;
    }

    /// Advances by one fixed step. Hides itself after the last cell.
    pub fn update(&mut self) {
        if !self.visible {
            return;
        }
        self.counter += 1;
        if self.counter >= UPDATES_PER_CELL {
            self.counter = 0;
            self.cell += 1;
            if self.cell >= CELLS_X * CELLS_Y {
                self.cell = 0;
                self.visible = false;
            }
        }
    }

    /// Row-major index of the cell to draw.
    #[inline]
    #[must_use]
    pub const fn cell(&self) -> u16 {
        self.cell
    }

    /// Where the animation plays.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// True while playing.
    #[inline]
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }
}
