//! # Session Hooks
//!
//! Audio and UI live outside the engine. States fire cues through
//! [`SessionHooks`]; every call is fire-and-forget and runs on the
//! simulation thread, so implementations must not block.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

/// Sounds the game asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Looping background track.
    BackgroundMusic,
    /// A sheep was caught.
    SheepCry,
    /// This player won.
    Win,
    /// This player lost.
    Lose,
}

/// Callbacks into the embedding application.
pub trait SessionHooks: Send + Sync {
    /// Plays a one-shot sound.
    fn play_sound(&self, cue: SoundCue) {
        let _ = cue;
    }

    /// Starts a looping track at `volume` (0.0 to 1.0).
    fn play_music(&self, cue: SoundCue, volume: f32) {
        let _ = (cue, volume);
    }

    /// Frees whatever player backs `cue`.
    fn release(&self, cue: SoundCue) {
        let _ = cue;
    }

    /// A winner was decided; the application may show its end dialog.
    fn game_ended(&self) {}

    /// A reconnection attempt is starting (`attempt` is 1-based).
    fn reconnecting(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }
}

/// Hooks that ignore everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentHooks;

impl SessionHooks for SilentHooks {}

/// Forwards to the application's hooks and reports `game_ended` to the
/// session, which waits on it before the post-game decision.
pub(crate) struct HookRelay {
    inner: Arc<dyn SessionHooks>,
    ended: Sender<()>,
}

impl HookRelay {
    pub(crate) fn new(inner: Arc<dyn SessionHooks>) -> (Self, Receiver<()>) {
        let (ended, receiver) = crossbeam_channel::unbounded();
        (Self { inner, ended }, receiver)
    }
}

impl SessionHooks for HookRelay {
    fn play_sound(&self, cue: SoundCue) {
        self.inner.play_sound(cue);
    }

    fn play_music(&self, cue: SoundCue, volume: f32) {
        self.inner.play_music(cue, volume);
    }

    fn release(&self, cue: SoundCue) {
        self.inner.release(cue);
    }

    fn game_ended(&self) {
        self.inner.game_ended();
        // The session may be gone already.
        let _ = self.ended.send(());
    }

    fn reconnecting(&self, attempt: u32, max_attempts: u32) {
        self.inner.reconnecting(attempt, max_attempts);
    }
}
