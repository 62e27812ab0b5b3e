//! Drag selection.

use super::Vec2;

/// Axis-aligned rectangle with `left <= right` and `top <= bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Right edge.
    pub right: f32,
    /// Bottom edge.
    pub bottom: f32,
}

impl Rect {
    /// The rectangle spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Edges included.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left && point.x <= self.right && point.y >= self.top && point.y <= self.bottom
    }
}

/// A rectangle being dragged by one player.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Selection {
    start: Vec2,
    end: Vec2,
    active: bool,
}

impl Selection {
    /// Pointer went down at `point`.
    pub fn begin(&mut self, point: Vec2) {
        self.start = point;
        self.end = point;
        self.active = true;
    }

    /// Pointer dragged to `point`. Returns the larger of the horizontal and
    /// vertical travel since the previous point.
    pub fn extend(&mut self, point: Vec2) -> f32 {
        let travel = (point.x - self.end.x).abs().max((point.y - self.end.y).abs());
        self.end = point;
        self.active = true;
        travel
    }

    /// Pointer released. Returns the final rectangle.
    pub fn finish(&mut self) -> Rect {
        self.active = false;
        self.rect()
    }

    /// Current rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_corners(self.start, self.end)
    }

    /// True between `begin` and `finish`.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }
}
