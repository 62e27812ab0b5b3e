//! Initial states: the host announces a game, the guest waits for it.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shepherd_core::{Entry, Frame, State};

use super::scenery::{centered_sprite, centered_text, draw_grass, sheep_sprite};
use super::{Ctx, RanchArgs, RanchDeps, RanchSnapshot};
use crate::game::generate_flock;
use crate::hooks::SoundCue;
use crate::protocol::SetupPacket;
use crate::SYNCHRONIZING;

/// Background music volume.
const MUSIC_VOLUME: f32 = 0.5;

/// Host side: draws a flock, announces it with the start time and moves on
/// to the countdown right away.
pub struct HostWaitingState {
    deps: RanchDeps,
    outbox: VecDeque<Vec<u8>>,
    games: u64,
}

impl HostWaitingState {
    /// Creates the state.
    #[must_use]
    pub fn new(deps: RanchDeps) -> Self {
        Self {
            deps,
            outbox: VecDeque::new(),
            games: 0,
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn seed(&self) -> u64 {
        self.deps
            .seed
            .unwrap_or_else(|| self.deps.clock.now_ms() as u64)
            .wrapping_add(self.games)
    }
}

impl State<RanchArgs, RanchSnapshot> for HostWaitingState {
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn on_state_start(&mut self, ctx: &mut Ctx<'_>, _entry: Entry<RanchArgs, RanchSnapshot>) {
        let flock = generate_flock(&mut ChaCha8Rng::seed_from_u64(self.seed()));
        self.games += 1;

        let start_time_ms = self
            .deps
            .clock
            .now_ms()
            .saturating_add(self.deps.countdown.as_millis() as i64);
        let setup = SetupPacket {
            start_time_ms,
            flock,
        };
        self.outbox.push_back(setup.encode());
        tracing::info!("Announced game starting at {} ms", start_time_ms);

        self.deps.hooks.play_music(SoundCue::BackgroundMusic, MUSIC_VOLUME);
        ctx.switch_with(
            SYNCHRONIZING,
            RanchArgs::Countdown {
                start_time_ms,
                flock: setup.flock,
            },
        );
    }

    fn produce_outgoing_network_message(&mut self) -> Option<Vec<u8>> {
        self.outbox.pop_front()
    }
}

/// Guest side: waits for the host's setup packet.
pub struct GuestWaitingState {
    deps: RanchDeps,
}

impl GuestWaitingState {
    /// Creates the state.
    #[must_use]
    pub const fn new(deps: RanchDeps) -> Self {
        Self { deps }
    }
}

impl State<RanchArgs, RanchSnapshot> for GuestWaitingState {
    fn on_state_start(&mut self, _ctx: &mut Ctx<'_>, _entry: Entry<RanchArgs, RanchSnapshot>) {
        self.deps.hooks.play_music(SoundCue::BackgroundMusic, MUSIC_VOLUME);
    }

    fn render(&mut self, ctx: &mut Ctx<'_>, frame: &mut Frame) {
        let display = *ctx.display();
        draw_grass(frame, &display, true);
        centered_text(frame, &display, "Waiting for the host...", display.height() / 2.0, 20.0);
        centered_sprite(frame, &display, sheep_sprite(self.deps.color()), 128.0);
    }

    fn accepts_network_messages(&self) -> bool {
        true
    }

    fn read_network_message(&mut self, ctx: &mut Ctx<'_>, payload: &[u8]) {
        match SetupPacket::decode(payload) {
            Ok(SetupPacket {
                start_time_ms,
                flock,
            }) => {
                tracing::info!("Received game starting at {} ms", start_time_ms);
                ctx.switch_with(
                    SYNCHRONIZING,
                    RanchArgs::Countdown {
                        start_time_ms,
                        flock,
                    },
                );
            }
            Err(e) => tracing::warn!("Ignoring {} byte payload while waiting: {}", payload.len(), e),
        }
    }
}
