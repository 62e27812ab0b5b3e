//! # Engine Configuration
//!
//! Plain configuration structs with sensible defaults. Both derive
//! `Deserialize` so that embedding applications can load them from a config
//! file; every field falls back to its default when omitted.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::{DEFAULT_TARGET_FPS, LOGICAL_HEIGHT, LOGICAL_WIDTH};

/// Configuration for the game loop.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Fixed simulation steps per second.
    pub target_fps: u32,
    /// Maximum input events buffered between the UI and the loop thread.
    pub input_queue_capacity: usize,
    /// Upper bound on the wall-clock gap fed into one loop iteration.
    ///
    /// Protects against an unbounded catch-up burst after the process was
    /// suspended for a long time.
    pub max_frame_time_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            input_queue_capacity: 256,
            max_frame_time_ms: 1000,
        }
    }
}

impl LoopConfig {
    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for a zero frame rate, a zero
    /// input capacity or a frame time cap shorter than one step.
    pub fn validate(&self) -> CoreResult<()> {
        if self.target_fps == 0 {
            return Err(CoreError::InvalidConfig("target_fps must be positive".into()));
        }
        if self.input_queue_capacity == 0 {
            return Err(CoreError::InvalidConfig(
                "input_queue_capacity must be positive".into(),
            ));
        }
        if self.max_frame_time() < self.step_duration() {
            return Err(CoreError::InvalidConfig(format!(
                "max_frame_time_ms ({}) is shorter than one step",
                self.max_frame_time_ms
            )));
        }
        Ok(())
    }

    /// Returns the duration of one fixed step.
    ///
    /// # Panics
    ///
    /// Panics if `target_fps` is zero.
    #[must_use]
    pub fn step_duration(&self) -> Duration {
        assert!(self.target_fps > 0, "target_fps must be positive");
        Duration::from_nanos(1_000_000_000 / u64::from(self.target_fps))
    }

    /// Returns the frame time cap as a duration.
    #[must_use]
    pub const fn max_frame_time(&self) -> Duration {
        Duration::from_millis(self.max_frame_time_ms)
    }
}

/// Screen geometry handed to states on every update and render.
///
/// Game coordinates are authored against a 320x480 logical portrait and
/// multiplied by the scale factors to get surface pixels.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayContext {
    /// Logical width in game units.
    pub logical_width: u32,
    /// Logical height in game units.
    pub logical_height: u32,
    /// Horizontal scale from logical units to surface pixels.
    pub scale_x: f32,
    /// Vertical scale from logical units to surface pixels.
    pub scale_y: f32,
}

impl Default for DisplayContext {
    fn default() -> Self {
        Self {
            logical_width: LOGICAL_WIDTH,
            logical_height: LOGICAL_HEIGHT,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl DisplayContext {
    /// Builds a context for a surface of the given pixel size.
    ///
    /// Scale factors are whole numbers (floored), never below 1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn for_surface(width: u32, height: u32) -> Self {
        let scale_x = (width / LOGICAL_WIDTH).max(1) as f32;
        let scale_y = (height / LOGICAL_HEIGHT).max(1) as f32;
        Self {
            scale_x,
            scale_y,
            ..Self::default()
        }
    }

    /// Width of the playfield in surface pixels.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn width(&self) -> f32 {
        self.logical_width as f32 * self.scale_x
    }

    /// Height of the playfield in surface pixels.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn height(&self) -> f32 {
        self.logical_height as f32 * self.scale_y
    }
}
