//! # Frame Recording
//!
//! States do not draw pixels. They record draw commands into a [`Frame`],
//! which the embedding application replays with whatever graphics backend it
//! owns. Coordinates are surface pixels.

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Opaque red.
    pub const RED: Self = Self::rgba(255, 0, 0, 255);
    /// Opaque blue.
    pub const BLUE: Self = Self::rgba(0, 0, 255, 255);

    /// Creates a color from its channels.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Identifier of a sprite sheet known to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteId(pub u16);

/// One recorded drawing operation.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Fill the whole surface.
    Clear {
        /// Fill color.
        color: Color,
    },
    /// Blend a translucent color over the whole surface.
    Tint {
        /// Overlay color (alpha is respected).
        color: Color,
    },
    /// Draw one cell of a sprite sheet.
    Sprite {
        /// Sprite sheet.
        sprite: SpriteId,
        /// Cell index inside the sheet (row-major).
        cell: u16,
        /// Left edge.
        x: f32,
        /// Top edge.
        y: f32,
        /// Drawn width.
        width: f32,
        /// Drawn height.
        height: f32,
    },
    /// Draw a line of text.
    Text {
        /// The text.
        text: String,
        /// Left edge of the baseline.
        x: f32,
        /// Baseline.
        y: f32,
        /// Font size.
        size: f32,
        /// Text color.
        color: Color,
    },
    /// Stroke an axis-aligned rectangle.
    RectOutline {
        /// Left edge.
        left: f32,
        /// Top edge.
        top: f32,
        /// Right edge.
        right: f32,
        /// Bottom edge.
        bottom: f32,
        /// Stroke color.
        color: Color,
    },
}

/// A recorded frame.
///
/// Frames are recycled by the surface: [`Frame::reset`] keeps the command
/// buffer's allocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    commands: Vec<DrawCommand>,
    sequence: u64,
}

impl Frame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all recorded commands and stamps the frame with a sequence number.
    pub fn reset(&mut self, sequence: u64) {
        self.commands.clear();
        self.sequence = sequence;
    }

    /// Records a command.
    #[inline]
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Records a full-surface clear.
    #[inline]
    pub fn clear(&mut self, color: Color) {
        self.push(DrawCommand::Clear { color });
    }

    /// Records a line of text.
    pub fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, color: Color) {
        self.push(DrawCommand::Text {
            text: text.into(),
            x,
            y,
            size,
            color,
        });
    }

    /// Returns the recorded commands in order.
    #[inline]
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Returns the sequence number assigned when the frame was acquired.
    #[inline]
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the number of recorded commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing was recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns true if any text command contains `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.commands.iter().any(|command| match command {
            DrawCommand::Text { text, .. } => text.contains(needle),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_keeps_nothing() {
        let mut frame = Frame::new();
        frame.clear(Color::BLACK);
        frame.text("hello", 0.0, 0.0, 12.0, Color::WHITE);
        assert_eq!(frame.len(), 2);
        assert!(frame.contains_text("hell"));

        frame.reset(9);
        assert!(frame.is_empty());
        assert_eq!(frame.sequence(), 9);
        assert!(!frame.contains_text("hell"));
    }
}
