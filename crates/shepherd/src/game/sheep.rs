//! Sheep and flock generation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use shepherd_networking::Role;

use super::Vec2;
use crate::{MAX_SHEEP, MAX_SHEEP_SPEED, MIN_SHEEP_SPEED};

/// Wool color, which also tells whose sheep it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SheepColor {
    /// Caught by the host.
    White = 0,
    /// Caught by the guest.
    Dark = 1,
}

impl SheepColor {
    /// The color a player of `role` catches.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Host => Self::White,
            Role::Guest => Self::Dark,
        }
    }

    /// Wire value.
    #[inline]
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }

    /// Parses a wire value.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::White),
            1 => Some(Self::Dark),
            _ => None,
        }
    }

    /// Lowercase name, for messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Dark => "dark",
        }
    }
}

/// One sheep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sheep {
    /// Owner color.
    pub color: SheepColor,
    /// Caught sheep stay in the flock, invisible, so indices never shift.
    pub visible: bool,
    /// Top-left corner.
    pub position: Vec2,
    /// Pixels per second.
    pub velocity: Vec2,
}

impl Sheep {
    /// A visible sheep.
    #[must_use]
    pub const fn new(color: SheepColor, position: Vec2, velocity: Vec2) -> Self {
        Self {
            color,
            visible: true,
            position,
            velocity,
        }
    }

    /// Maps a normalized position (0..1 on both axes) onto a playfield of
    /// `width` x `height` pixels.
    #[must_use]
    pub fn scaled(mut self, width: f32, height: f32) -> Self {
        self.position = Vec2::new(self.position.x * width, self.position.y * height);
        self
    }

    /// Moves for `dt` seconds, bouncing off `[0, max_x]` x `[0, max_y]`.
    pub fn advance(&mut self, dt: f32, max_x: f32, max_y: f32) {
        self.position = self.position + self.velocity * dt;

        if self.position.x > max_x {
            self.position.x = max_x;
            self.velocity.x = -self.velocity.x;
        } else if self.position.x < 0.0 {
            self.position.x = 0.0;
            self.velocity.x = -self.velocity.x;
        }

        if self.position.y > max_y {
            self.position.y = max_y;
            self.velocity.y = -self.velocity.y;
        } else if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = -self.velocity.y;
        }
    }
}

/// Draws a fresh flock: colors alternate, positions are normalized, each
/// velocity axis has a random speed in the allowed range and a random sign.
pub fn generate_flock(rng: &mut impl Rng) -> Vec<Sheep> {
    (0..MAX_SHEEP)
        .map(|index| {
            let color = if index % 2 == 0 {
                SheepColor::White
            } else {
                SheepColor::Dark
            };
            let position = Vec2::new(rng.gen::<f32>(), rng.gen::<f32>());
            let velocity = Vec2::new(random_speed(rng), random_speed(rng));
            Sheep::new(color, position, velocity)
        })
        .collect()
}

fn random_speed(rng: &mut impl Rng) -> f32 {
    let speed = rng.gen_range(MIN_SHEEP_SPEED..MAX_SHEEP_SPEED);
    if rng.gen::<bool>() {
        speed
    } else {
        -speed
    }
}
