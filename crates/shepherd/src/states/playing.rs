//! The catch-the-sheep round.
//!
//! Each peer simulates the whole flock locally from the shared setup; only
//! selections, catches and the end of the game cross the wire. A drag
//! catches when every visible sheep whose top-left corner lies inside the
//! rectangle has the player's color.

use std::collections::VecDeque;

use shepherd_core::{Color, DrawCommand, Entry, Frame, InputEvent, InputKind, State, StateId};

use super::scenery::{draw_grass, sheep_size, sheep_sprite, sprites};
use super::{Ctx, RanchArgs, RanchDeps, RanchSnapshot};
use crate::game::{Poof, Rect, Selection, Sheep, SheepColor, Vec2};
use crate::hooks::SoundCue;
use crate::protocol::PlayPacket;
use crate::{GAME_OVER, MAX_SHEEP, SELECTION_TOLERANCE};

/// Score font size in logical units.
const SCORE_SIZE: f32 = 40.0;

/// The playing state.
pub struct PlayingState {
    deps: RanchDeps,
    color: SheepColor,
    flock: Vec<Sheep>,
    poofs: Vec<Poof>,
    caught: usize,
    player: Selection,
    opponent: Selection,
    /// Rectangle released by the player, resolved on the next update.
    released: Option<Rect>,
    outbox: VecDeque<Vec<u8>>,
}

impl PlayingState {
    /// Creates the state.
    #[must_use]
    pub fn new(deps: RanchDeps) -> Self {
        let color = deps.color();
        Self {
            deps,
            color,
            flock: Vec::new(),
            poofs: Vec::new(),
            caught: 0,
            player: Selection::default(),
            opponent: Selection::default(),
            released: None,
            outbox: VecDeque::new(),
        }
    }

    /// Sheep of this player's color caught so far.
    #[inline]
    #[must_use]
    pub const fn caught(&self) -> usize {
        self.caught
    }

    /// The flock, caught sheep included.
    #[must_use]
    pub fn flock(&self) -> &[Sheep] {
        &self.flock
    }

    fn send(&mut self, packet: &PlayPacket) {
        self.outbox.push_back(packet.encode());
    }

    fn hide(&mut self, index: usize) {
        if let (Some(sheep), Some(poof)) = (self.flock.get_mut(index), self.poofs.get_mut(index)) {
            sheep.visible = false;
            poof.play_at(sheep.position);
            self.deps.hooks.play_sound(SoundCue::SheepCry);
        }
    }

    /// Catches the sheep inside `rect` if they are all of this player's
    /// color. Returns true once the player has won.
    fn resolve_selection(&mut self, rect: Rect) -> bool {
        let inside: Vec<usize> = self
            .flock
            .iter()
            .enumerate()
            .filter(|(_, sheep)| sheep.visible && rect.contains(sheep.position))
            .map(|(index, _)| index)
            .collect();

        let clean = inside.iter().all(|&index| self.flock[index].color == self.color);
        if !inside.is_empty() && clean {
            for &index in &inside {
                self.hide(index);
            }
            self.caught += inside.len();
            tracing::debug!("Caught {} sheep, {} total", inside.len(), self.caught);
            #[allow(clippy::cast_possible_truncation)]
            let indices = inside.iter().map(|&index| index as u32).collect();
            self.send(&PlayPacket::HideSheep { indices });
        } else if !inside.is_empty() {
            tracing::debug!("Selection mixed colors, nothing caught");
        }

        self.caught >= MAX_SHEEP / 2
    }

    fn on_peer_packet(&mut self, ctx: &mut Ctx<'_>, packet: PlayPacket) {
        match packet {
            PlayPacket::SelectionBegin { x, y } => self.opponent.begin(Vec2::new(x, y)),
            PlayPacket::SelectionMoving { x, y } => {
                self.opponent.extend(Vec2::new(x, y));
            }
            PlayPacket::SelectionEnd => {
                self.opponent.finish();
            }
            PlayPacket::HideSheep { indices } => {
                for index in indices {
                    let index = index as usize;
                    match self.flock.get(index).map(|sheep| sheep.visible) {
                        Some(true) => self.hide(index),
                        Some(false) => tracing::debug!("Sheep {} already hidden", index),
                        None => tracing::warn!("Peer hid unknown sheep {}", index),
                    }
                }
            }
            PlayPacket::EndGame { winner } => {
                tracing::info!("Peer reports the {} player won", winner.name());
                ctx.switch_with(GAME_OVER, RanchArgs::Winner(winner));
            }
        }
    }

    fn draw_selection(frame: &mut Frame, selection: &Selection, color: Color) {
        if selection.is_active() {
            let rect = selection.rect();
            frame.push(DrawCommand::RectOutline {
                left: rect.left,
                top: rect.top,
                right: rect.right,
                bottom: rect.bottom,
                color,
            });
        }
    }
}

impl State<RanchArgs, RanchSnapshot> for PlayingState {
    fn on_state_start(&mut self, ctx: &mut Ctx<'_>, entry: Entry<RanchArgs, RanchSnapshot>) {
        self.player = Selection::default();
        self.opponent = Selection::default();
        self.released = None;
        self.outbox.clear();

        let display = *ctx.display();
        let restored = match entry {
            Entry::Switch {
                args: Some(RanchArgs::Flock(flock)),
                ..
            } => {
                self.flock = flock
                    .into_iter()
                    .map(|sheep| sheep.scaled(display.width(), display.height()))
                    .collect();
                self.caught = 0;
                true
            }
            other => match other.into_snapshot() {
                Some(RanchSnapshot::Playing { flock }) => {
                    self.caught = flock
                        .iter()
                        .filter(|sheep| !sheep.visible && sheep.color == self.color)
                        .count();
                    self.flock = flock;
                    true
                }
                _ => false,
            },
        };

        if !restored {
            tracing::warn!("Game entered without a flock, back to waiting");
            ctx.switch_to(StateId::INITIAL);
            return;
        }

        self.poofs = vec![Poof::default(); self.flock.len()];
        tracing::info!(
            "Playing as {} with {} sheep, {} already caught",
            self.color.name(),
            self.flock.len(),
            self.caught
        );
    }

    fn on_state_save(&self) -> Option<RanchSnapshot> {
        Some(RanchSnapshot::Playing {
            flock: self.flock.clone(),
        })
    }

    fn on_state_end(&mut self) {
        self.deps.hooks.release(SoundCue::SheepCry);
    }

    fn read_input_event(&mut self, _ctx: &mut Ctx<'_>, event: InputEvent) {
        let point = Vec2::new(event.x, event.y);
        match event.kind {
            InputKind::Down => {
                self.player.begin(point);
                self.send(&PlayPacket::SelectionBegin {
                    x: event.x,
                    y: event.y,
                });
            }
            InputKind::Move => {
                if self.player.extend(point) >= SELECTION_TOLERANCE {
                    self.send(&PlayPacket::SelectionMoving {
                        x: event.x,
                        y: event.y,
                    });
                }
            }
            InputKind::Up => {
                self.player.extend(point);
                self.released = Some(self.player.finish());
                self.send(&PlayPacket::SelectionEnd);
            }
        }
    }

    fn update(&mut self, ctx: &mut Ctx<'_>, dt: f32) {
        if let Some(rect) = self.released.take() {
            if self.resolve_selection(rect) {
                tracing::info!("Caught every {} sheep", self.color.name());
                self.send(&PlayPacket::EndGame { winner: self.color });
                ctx.switch_with(GAME_OVER, RanchArgs::Winner(self.color));
                return;
            }
        }

        let display = ctx.display();
        let size = sheep_size(display);
        let max_x = display.width() - size;
        let max_y = display.height() - size;
        for sheep in self.flock.iter_mut().filter(|sheep| sheep.visible) {
            sheep.advance(dt, max_x, max_y);
        }

        for poof in &mut self.poofs {
            poof.update();
        }
    }

    fn render(&mut self, ctx: &mut Ctx<'_>, frame: &mut Frame) {
        let display = *ctx.display();
        let size = sheep_size(&display);
        draw_grass(frame, &display, false);

        for sheep in self.flock.iter().filter(|sheep| sheep.visible) {
            frame.push(DrawCommand::Sprite {
                sprite: sheep_sprite(sheep.color),
                cell: 0,
                x: sheep.position.x,
                y: sheep.position.y,
                width: size,
                height: size,
            });
        }

        for poof in self.poofs.iter().filter(|poof| poof.is_visible()) {
            frame.push(DrawCommand::Sprite {
                sprite: sprites::POOF,
                cell: poof.cell(),
                x: poof.position().x,
                y: poof.position().y,
                width: size,
                height: size,
            });
        }

        let score = self.caught.to_string();
        let score_size = SCORE_SIZE * display.scale_y;
        #[allow(clippy::cast_precision_loss)]
        let score_x = (display.width() - score.len() as f32 * score_size * 0.5) / 2.0;
        frame.text(score, score_x, 64.0 * display.scale_y, score_size, Color::WHITE);

        Self::draw_selection(frame, &self.player, Color::RED);
        Self::draw_selection(frame, &self.opponent, Color::BLUE);
    }

    fn accepts_network_messages(&self) -> bool {
        true
    }

    fn read_network_message(&mut self, ctx: &mut Ctx<'_>, payload: &[u8]) {
        match PlayPacket::decode(payload) {
            Ok(packet) => self.on_peer_packet(ctx, packet),
            Err(e) => tracing::warn!("Ignoring peer payload: {}", e),
        }
    }

    fn produce_outgoing_network_message(&mut self) -> Option<Vec<u8>> {
        self.outbox.pop_front()
    }
}
