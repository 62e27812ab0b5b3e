//! # Fixed-Step Clock
//!
//! Accumulates wall-clock time and hands it out in constant-size steps.
//!
//! ## Design
//!
//! - Integer nanosecond arithmetic (`Duration`), so 350ms at 60 FPS is
//!   exactly 21 steps with 14ns carried over
//! - The remainder is never dropped and never counted twice
//! - Each elapsed gap is clamped to bound the burst after a stall

use std::time::Duration;

/// Fixed-timestep accumulator.
#[derive(Clone, Debug)]
pub struct FixedStep {
    /// Size of one step.
    step: Duration,
    /// Time not yet consumed by steps.
    accumulator: Duration,
    /// Cap on a single elapsed gap.
    max_frame_time: Duration,
    /// Steps handed out so far.
    step_count: u64,
}

impl FixedStep {
    /// Creates a clock ticking `target_fps` times per second.
    ///
    /// # Panics
    ///
    /// Panics if `target_fps` is zero.
    #[must_use]
    pub fn new(target_fps: u32) -> Self {
        assert!(target_fps > 0, "target_fps must be positive");
        Self {
            step: Duration::from_nanos(1_000_000_000 / u64::from(target_fps)),
            accumulator: Duration::ZERO,
            max_frame_time: Duration::MAX,
            step_count: 0,
        }
    }

    /// Caps the elapsed time accepted by a single [`FixedStep::accumulate`].
    #[must_use]
    pub const fn with_max_frame_time(mut self, max_frame_time: Duration) -> Self {
        self.max_frame_time = max_frame_time;
        self
    }

    /// Adds elapsed wall-clock time.
    ///
    /// Returns the amount actually accepted after clamping.
    pub fn accumulate(&mut self, elapsed: Duration) -> Duration {
        let accepted = elapsed.min(self.max_frame_time);
        if accepted < elapsed {
            tracing::debug!(
                "Frame gap of {:?} clamped to {:?}",
                elapsed,
                self.max_frame_time
            );
        }
        self.accumulator += accepted;
        accepted
    }

    /// Returns true while at least one whole step is banked.
    #[inline]
    #[must_use]
    pub fn should_step(&self) -> bool {
        self.accumulator >= self.step
    }

    /// Consumes one step, returning its length.
    ///
    /// Call only after [`FixedStep::should_step`] returned true.
    #[inline]
    pub fn consume_step(&mut self) -> Duration {
        self.accumulator = self.accumulator.saturating_sub(self.step);
        self.step_count += 1;
        self.step
    }

    /// Time banked but not yet consumed.
    #[inline]
    #[must_use]
    pub const fn remainder(&self) -> Duration {
        self.accumulator
    }

    /// Time still missing before the next step is due.
    #[must_use]
    pub fn time_until_next_step(&self) -> Duration {
        self.step.saturating_sub(self.accumulator)
    }

    /// Length of one step.
    #[inline]
    #[must_use]
    pub const fn step_duration(&self) -> Duration {
        self.step
    }

    /// Steps handed out so far.
    #[inline]
    #[must_use]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TARGET_FPS)
    }
}
