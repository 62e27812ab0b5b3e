//! Integration test: two state machines play a game over an in-memory port,
//! driven step by step with a manual clock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use shepherd::states::registry;
use shepherd::{
    ManualClock, RanchDeps, RanchMachine, RanchSnapshot, SessionHooks, Sheep, SheepColor,
    SoundCue, Vec2, WallClock, GAME_OVER, PLAYING, SYNCHRONIZING,
};
use shepherd_core::{
    ChannelPort, DisplayContext, Frame, InputEvent, SavedSession, Simulation, StateId,
};
use shepherd_networking::Role;

const STEP: Duration = Duration::from_millis(16);
const START_MS: i64 = 1_000_000;

#[derive(Default)]
struct Recorder {
    cues: Mutex<Vec<SoundCue>>,
    ended: AtomicU32,
}

impl SessionHooks for Recorder {
    fn play_sound(&self, cue: SoundCue) {
        self.cues.lock().push(cue);
    }

    fn game_ended(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

fn machine(
    role: Role,
    port: ChannelPort,
    clock: &Arc<ManualClock>,
    hooks: &Arc<Recorder>,
) -> RanchMachine {
    let deps = RanchDeps {
        role,
        clock: Arc::clone(clock) as Arc<dyn WallClock>,
        hooks: Arc::clone(hooks) as Arc<dyn SessionHooks>,
        countdown: Duration::from_secs(5),
        seed: Some(7),
    };
    let mut machine = RanchMachine::new(Arc::new(port), DisplayContext::default());
    machine.reload(registry(&deps));
    machine
}

/// Whites in the top-left corner, darks near the bottom, none moving.
fn crafted_flock() -> Vec<Sheep> {
    let parked = |color, x, y| Sheep::new(color, Vec2::new(x, y), Vec2::ZERO);
    vec![
        parked(SheepColor::White, 20.0, 20.0),
        parked(SheepColor::Dark, 150.0, 300.0),
        parked(SheepColor::White, 60.0, 60.0),
        parked(SheepColor::Dark, 200.0, 350.0),
        parked(SheepColor::White, 100.0, 100.0),
        parked(SheepColor::Dark, 250.0, 400.0),
    ]
}

struct Game {
    clock: Arc<ManualClock>,
    host_hooks: Arc<Recorder>,
    guest_hooks: Arc<Recorder>,
    host: RanchMachine,
    guest: RanchMachine,
}

fn game() -> Game {
    let clock = Arc::new(ManualClock::new(START_MS));
    let host_hooks = Arc::new(Recorder::default());
    let guest_hooks = Arc::new(Recorder::default());
    let (host_port, guest_port) = ChannelPort::pair();
    Game {
        host: machine(Role::Host, host_port, &clock, &host_hooks),
        guest: machine(Role::Guest, guest_port, &clock, &guest_hooks),
        clock,
        host_hooks,
        guest_hooks,
    }
}

fn crafted_game() -> Game {
    let mut game = game();
    for machine in [&mut game.host, &mut game.guest] {
        machine.switch(
            PLAYING,
            None,
            Some(RanchSnapshot::Playing {
                flock: crafted_flock(),
            }),
        );
        assert_eq!(machine.current_id(), Some(PLAYING));
    }
    game
}

fn drag(machine: &mut RanchMachine, from: (f32, f32), to: (f32, f32)) {
    machine.read_input_event(InputEvent::down(from.0, from.1));
    machine.read_input_event(InputEvent::moved(to.0, to.1));
    machine.read_input_event(InputEvent::up(to.0, to.1));
}

fn rendered(machine: &mut RanchMachine) -> Frame {
    let mut frame = Frame::new();
    machine.render(&mut frame);
    frame
}

fn flock_of(machine: &RanchMachine) -> Vec<Sheep> {
    match machine.save().payload {
        Some(RanchSnapshot::Playing { flock }) => flock,
        other => panic!("not playing: {other:?}"),
    }
}

#[test]
fn test_both_peers_start_together() {
    let mut game = game();

    game.host.start(None);
    assert_eq!(game.host.current_id(), Some(SYNCHRONIZING));

    game.guest.start(None);
    assert_eq!(game.guest.current_id(), Some(StateId::INITIAL));
    game.guest.update(STEP);
    assert_eq!(game.guest.current_id(), Some(SYNCHRONIZING));

    // Same start time and flock on both sides.
    let host_countdown = game.host.save();
    let guest_countdown = game.guest.save();
    assert_eq!(host_countdown, guest_countdown);
    assert!(matches!(
        host_countdown.payload,
        Some(RanchSnapshot::Countdown { start_time_ms, .. }) if start_time_ms == START_MS + 5_000
    ));
    assert!(rendered(&mut game.guest).contains_text("Catch the dark sheep!"));
    assert!(rendered(&mut game.host).contains_text("Starting in 5"));

    game.clock.advance(4_999);
    game.host.update(STEP);
    assert_eq!(game.host.current_id(), Some(SYNCHRONIZING));

    game.clock.advance(1);
    game.host.update(STEP);
    game.guest.update(STEP);
    assert_eq!(game.host.current_id(), Some(PLAYING));
    assert_eq!(game.guest.current_id(), Some(PLAYING));

    // Positions were scaled onto the same playfield.
    assert_eq!(flock_of(&game.host), flock_of(&game.guest));
    assert!(rendered(&mut game.host).contains_text("0"));
}

#[test]
fn test_host_catches_every_white_sheep_and_wins() {
    let mut game = crafted_game();

    drag(&mut game.host, (0.0, 0.0), (200.0, 200.0));
    game.host.update(STEP);
    assert_eq!(game.host.current_id(), Some(GAME_OVER));
    assert!(rendered(&mut game.host).contains_text("You won!"));

    game.guest.update(STEP);
    assert_eq!(game.guest.current_id(), Some(GAME_OVER));
    assert!(rendered(&mut game.guest).contains_text("You lose!"));

    let winner = Some(RanchSnapshot::GameOver {
        winner: SheepColor::White,
    });
    assert_eq!(game.host.save().payload, winner);
    assert_eq!(game.guest.save().payload, winner);

    assert_eq!(
        *game.host_hooks.cues.lock(),
        vec![SoundCue::SheepCry, SoundCue::SheepCry, SoundCue::SheepCry, SoundCue::Win]
    );
    assert_eq!(
        *game.guest_hooks.cues.lock(),
        vec![SoundCue::SheepCry, SoundCue::SheepCry, SoundCue::SheepCry, SoundCue::Lose]
    );
    assert_eq!(game.host_hooks.ended.load(Ordering::SeqCst), 1);
    assert_eq!(game.guest_hooks.ended.load(Ordering::SeqCst), 1);
}

#[test]
fn test_mixed_selection_catches_nothing() {
    let mut game = crafted_game();

    // Reaches the first dark sheep as well.
    drag(&mut game.guest, (0.0, 0.0), (160.0, 310.0));
    game.guest.update(STEP);
    game.host.update(STEP);

    assert_eq!(game.guest.current_id(), Some(PLAYING));
    assert_eq!(game.host.current_id(), Some(PLAYING));
    assert!(flock_of(&game.guest).iter().all(|sheep| sheep.visible));
    assert!(flock_of(&game.host).iter().all(|sheep| sheep.visible));
    assert!(game.guest_hooks.cues.lock().is_empty());
}

#[test]
fn test_partial_catch_survives_save_and_restore() {
    let mut game = crafted_game();

    drag(&mut game.host, (0.0, 0.0), (40.0, 40.0));
    game.host.update(STEP);
    game.guest.update(STEP);
    assert!(!flock_of(&game.guest)[0].visible);

    let saved = game.host.save();
    let bytes = saved.to_bytes().unwrap();

    // A new process rebuilds the host from the bytes alone.
    let (port, _peer) = ChannelPort::pair();
    let mut restored = machine(Role::Host, port, &game.clock, &game.host_hooks);
    restored.start(Some(SavedSession::from_bytes(&bytes).unwrap()));

    assert_eq!(restored.current_id(), Some(PLAYING));
    assert_eq!(restored.save(), saved);
    assert!(rendered(&mut restored).contains_text("1"));
}

#[test]
fn test_connection_loss_parks_the_game() {
    let mut game = crafted_game();
    let before = flock_of(&game.host);

    game.host.handle_connection_lost();
    assert_eq!(game.host.current_id(), Some(StateId::DISCONNECTED));
    assert!(rendered(&mut game.host).contains_text("Disconnected"));
    assert_eq!(game.host.session_for_persistence().current_state, PLAYING);

    game.host.update(STEP);
    game.host.handle_connection_recovered();
    assert_eq!(game.host.current_id(), Some(PLAYING));
    assert_eq!(flock_of(&game.host), before);
}
