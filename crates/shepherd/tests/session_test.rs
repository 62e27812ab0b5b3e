//! Integration test: two sessions on localhost, each with its own loop
//! thread and TCP transport.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use shepherd::{HostDecision, RanchSnapshot, Session, SessionConfig, SilentHooks, SYNCHRONIZING};
use shepherd_core::{SavedSession, StateId};
use shepherd_networking::{NetConfig, PeerInfo, ReconnectPolicy};

fn config(port: u16) -> SessionConfig {
    SessionConfig {
        net: NetConfig::default().with_port(port),
        reconnect: ReconnectPolicy {
            max_attempts: 100,
            retry_delay_ms: 20,
        },
        // Long enough that the game never leaves the countdown.
        countdown_secs: 600,
        guest_decision_timeout_ms: 300,
        flock_seed: Some(3),
        ..SessionConfig::default()
    }
}

fn session(port: u16, is_group_owner: bool) -> Session {
    let peer = PeerInfo {
        peer_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        is_group_owner,
    };
    Session::new(&peer, config(port), Arc::new(SilentHooks)).unwrap()
}

/// Connects a host and a guest; the guest retries until the host listens.
fn connected_pair(port: u16) -> (Session, Session) {
    let host = thread::spawn(move || {
        let mut host = session(port, true);
        host.establish().unwrap();
        host
    });

    let mut guest = session(port, false);
    guest.establish().unwrap();
    (host.join().unwrap(), guest)
}

fn wait_for_state(session: &Session, state: StateId) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while session.current_state() != Some(state) {
        assert!(Instant::now() < deadline, "never reached state {state}");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_paused_host_saves_the_countdown() {
    let (mut host, guest) = connected_pair(53150);
    assert!(host.is_game_master());
    assert!(!guest.is_game_master());

    wait_for_state(&host, SYNCHRONIZING);
    wait_for_state(&guest, SYNCHRONIZING);

    host.pause();
    let bytes = host.save().unwrap();
    let saved: SavedSession<RanchSnapshot> = SavedSession::from_bytes(&bytes).unwrap();
    assert_eq!(saved.current_state, SYNCHRONIZING);
    assert!(matches!(
        saved.payload,
        Some(RanchSnapshot::Countdown { ref flock, .. }) if flock.len() == shepherd::MAX_SHEEP
    ));

    host.shutdown();
    guest.shutdown();
}

#[test]
fn test_guest_follows_the_end_decision() {
    let (mut host, mut guest) = connected_pair(53151);
    wait_for_state(&guest, SYNCHRONIZING);

    // Flushing waits for the guest to close its side.
    let host = thread::spawn(move || {
        host.send_host_decision(HostDecision::End).unwrap();
        host
    });

    assert_eq!(guest.await_host_decision().unwrap(), HostDecision::End);
    assert!(!guest.transport().is_communicating());
    assert!(guest.send_host_decision(HostDecision::End).is_err());

    let host = host.join().unwrap();
    assert!(!host.transport().is_communicating());
}

#[test]
fn test_silent_host_counts_as_end() {
    let (mut host, mut guest) = connected_pair(53152);
    wait_for_state(&guest, SYNCHRONIZING);

    let started = Instant::now();
    assert_eq!(guest.await_host_decision().unwrap(), HostDecision::End);
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(host.await_host_decision().is_err());

    guest.shutdown();
    host.shutdown();
}

#[test]
fn test_polling_saves_does_not_stall_the_game() {
    let (host, mut guest) = connected_pair(53153);

    // Every save pauses and resumes the guest's loop.
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let bytes = guest.save().unwrap();
        let saved: SavedSession<RanchSnapshot> = SavedSession::from_bytes(&bytes).unwrap();
        if saved.current_state == SYNCHRONIZING {
            break;
        }
        assert!(Instant::now() < deadline, "guest stuck in {}", saved.current_state);
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(guest.current_state(), Some(SYNCHRONIZING));

    guest.shutdown();
    host.shutdown();
}
