//! # Game Entities
//!
//! Plain data driven by the playing state. Nothing here touches the network
//! or the clock.

mod poof;
mod selection;
mod sheep;

pub use poof::Poof;
pub use selection::{Rect, Selection};
pub use sheep::{generate_flock, Sheep, SheepColor};

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

/// 2D vector in surface pixels (or normalized units before scaling).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}
