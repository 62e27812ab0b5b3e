//! Drawing helpers shared by the states.

use shepherd_core::{Color, DisplayContext, DrawCommand, Frame, SpriteId};

use crate::game::SheepColor;
use crate::SHEEP_SIZE;

/// Sprite sheets the renderer is expected to know.
pub mod sprites {
    use shepherd_core::SpriteId;

    /// Tileable grass.
    pub const GRASS: SpriteId = SpriteId(0);
    /// White sheep.
    pub const WHITE_SHEEP: SpriteId = SpriteId(1);
    /// Dark sheep.
    pub const DARK_SHEEP: SpriteId = SpriteId(2);
    /// 5x5 smoke puff sheet.
    pub const POOF: SpriteId = SpriteId(3);
    /// Sheep shown while disconnected.
    pub const SAD_SHEEP: SpriteId = SpriteId(4);
}

/// Grass tile size in logical units.
const TILE: f32 = 64.0;

const SHADE: Color = Color::rgba(32, 32, 32, 96);

pub(crate) fn sheep_sprite(color: SheepColor) -> SpriteId {
    match color {
        SheepColor::White => sprites::WHITE_SHEEP,
        SheepColor::Dark => sprites::DARK_SHEEP,
    }
}

/// Sheep side in surface pixels.
pub(crate) fn sheep_size(display: &DisplayContext) -> f32 {
    SHEEP_SIZE * display.scale_x.min(display.scale_y)
}

/// Tiles the grass over the playfield, optionally shaded for overlays.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub(crate) fn draw_grass(frame: &mut Frame, display: &DisplayContext, shaded: bool) {
    frame.clear(Color::BLACK);
    let tile_w = TILE * display.scale_x;
    let tile_h = TILE * display.scale_y;
    let columns = (display.width() / tile_w).ceil() as u32;
    let rows = (display.height() / tile_h).ceil() as u32;
    for row in 0..rows {
        for column in 0..columns {
            frame.push(DrawCommand::Sprite {
                sprite: sprites::GRASS,
                cell: 0,
                x: column as f32 * tile_w,
                y: row as f32 * tile_h,
                width: tile_w,
                height: tile_h,
            });
        }
    }
    if shaded {
        frame.push(DrawCommand::Tint { color: SHADE });
    }
}

/// Draws `text` horizontally centered at baseline `y`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn centered_text(frame: &mut Frame, display: &DisplayContext, text: &str, y: f32, size: f32) {
    let size = size * display.scale_y;
    let approx_width = text.chars().count() as f32 * size * 0.5;
    frame.text(text, (display.width() - approx_width) / 2.0, y, size, Color::WHITE);
}

/// Draws one sprite centered horizontally, `offset` pixels below the middle.
pub(crate) fn centered_sprite(frame: &mut Frame, display: &DisplayContext, sprite: SpriteId, offset: f32) {
    let size = sheep_size(display) * 2.0;
    frame.push(DrawCommand::Sprite {
        sprite,
        cell: 0,
        x: (display.width() - size) / 2.0,
        y: (display.height() - size) / 2.0 + offset,
        width: size,
        height: size,
    });
}
