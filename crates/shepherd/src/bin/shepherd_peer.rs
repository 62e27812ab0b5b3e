//! # Shepherd Peer
//!
//! A headless peer: connects, plays with scripted random drags and logs the
//! session. Run one host and one guest to watch a full game.
//!
//! ## Usage
//!
//! ```bash
//! shepherd_peer --host --rounds 2
//! shepherd_peer --guest 192.168.49.1
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shepherd::{HostDecision, Session, SessionConfig, SessionHooks, SoundCue};
use shepherd_core::{InputEvent, InputSender};
use shepherd_networking::PeerInfo;

/// Time between two scripted drags.
const DRAG_INTERVAL: Duration = Duration::from_millis(250);

/// Slice used when waiting for the end of a game.
const WAIT_SLICE: Duration = Duration::from_millis(500);

/// Logs every cue instead of playing it.
struct LoggingHooks;

impl SessionHooks for LoggingHooks {
    fn play_sound(&self, cue: SoundCue) {
        tracing::debug!("Sound {:?}", cue);
    }

    fn play_music(&self, cue: SoundCue, volume: f32) {
        tracing::debug!("Music {:?} at {:.1}", cue, volume);
    }

    fn game_ended(&self) {
        tracing::info!("Game ended");
    }

    fn reconnecting(&self, attempt: u32, max_attempts: u32) {
        tracing::info!("Reconnecting {}/{}", attempt, max_attempts);
    }
}

/// Drags random rectangles until told to stop.
fn spawn_scripted_input(
    input: InputSender,
    width: f32,
    height: f32,
    seed: u64,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        while !stop.load(Ordering::Acquire) {
            let (x1, y1) = (rng.gen_range(0.0..width), rng.gen_range(0.0..height));
            let (x2, y2) = (rng.gen_range(0.0..width), rng.gen_range(0.0..height));
            input.submit(InputEvent::down(x1, y1));
            for step in 1..=4_u8 {
                let t = f32::from(step) / 4.0;
                input.submit(InputEvent::moved(x1 + (x2 - x1) * t, y1 + (y2 - y1) * t));
            }
            input.submit(InputEvent::up(x2, y2));
            thread::sleep(DRAG_INTERVAL);
        }
    })
}

/// Waits for the current game to end, reconnecting if the link drops.
/// Returns false when the deadline passes or the peer is gone for good.
fn wait_for_game_end(session: &mut Session, deadline: Option<Instant>) -> bool {
    loop {
        if session.wait_for_game_end(WAIT_SLICE) {
            return true;
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            tracing::info!("Duration elapsed");
            return false;
        }
        if !session.transport().is_communicating() {
            tracing::warn!("Link down, trying to reconnect");
            if let Err(e) = session.reconnect() {
                tracing::error!("Peer lost: {}", e);
                return false;
            }
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut host = false;
    let mut guest_of: Option<IpAddr> = None;
    let mut port: Option<u16> = None;
    let mut config_path: Option<String> = None;
    let mut duration_secs: Option<u64> = None;
    let mut rounds = 1_u32;
    let mut seed: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => host = true,
            "--guest" | "-g" => {
                if i + 1 < args.len() {
                    guest_of = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    port = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--duration" | "-d" => {
                if i + 1 < args.len() {
                    duration_secs = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--rounds" | "-r" => {
                if i + 1 < args.len() {
                    rounds = args[i + 1].parse().unwrap_or(1).max(1);
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Usage: shepherd_peer (--host | --guest <ADDR>) [OPTIONS]");
                println!();
                println!("Options:");
                println!("      --host                 Accept the other peer and lead the game");
                println!("  -g, --guest <ADDR>         Dial the host at ADDR");
                println!("  -p, --port <PORT>          TCP port (default: 53127)");
                println!("  -c, --config <FILE>        TOML session config");
                println!("  -d, --duration <SECS>      Give up after N seconds");
                println!("  -r, --rounds <NUM>         Games the host plays before ending (default: 1)");
                println!("  -s, --seed <SEED>          Flock seed (host) and input seed");
                println!("  -h, --help                 Show this help");
                return;
            }
            other => eprintln!("Ignoring unknown argument {other}"),
        }
        i += 1;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let peer = match (host, guest_of) {
        (true, None) => PeerInfo {
            peer_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            is_group_owner: true,
        },
        (false, Some(address)) => PeerInfo {
            peer_address: address,
            is_group_owner: false,
        },
        _ => {
            eprintln!("Pass exactly one of --host or --guest <ADDR> (see --help)");
            std::process::exit(2);
        }
    };

    let mut config = match config_path {
        Some(path) => match SessionConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Cannot load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SessionConfig::default(),
    };
    if let Some(port) = port {
        config.net.port = port;
    }
    if seed.is_some() {
        config.flock_seed = seed;
    }
    let end_dialog_delay = config.end_dialog_delay();
    let (width, height) = (config.display.width(), config.display.height());

    let mut session = match Session::new(&peer, config, Arc::new(LoggingHooks)) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Invalid session: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = session.establish() {
        tracing::error!("Could not reach the other peer: {}", e);
        std::process::exit(1);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let input = spawn_scripted_input(
        session.input_sender(),
        width,
        height,
        seed.unwrap_or(0) ^ u64::from(host),
        Arc::clone(&stop),
    );

    let deadline = duration_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut played = 0_u32;
    while wait_for_game_end(&mut session, deadline) {
        played += 1;
        tracing::info!("Game {} finished", played);

        let decision = if session.is_game_master() {
            thread::sleep(end_dialog_delay);
            let decision = if played < rounds {
                HostDecision::PlayAgain
            } else {
                HostDecision::End
            };
            session.send_host_decision(decision).map(|()| decision)
        } else {
            session.await_host_decision()
        };

        match decision {
            Ok(HostDecision::PlayAgain) => {}
            Ok(HostDecision::End) => break,
            Err(e) => {
                tracing::error!("Post-game decision failed: {}", e);
                break;
            }
        }
    }

    stop.store(true, Ordering::Release);
    let _ = input.join();
    let stats = session.transport().stats();
    tracing::info!(
        "Sent {} messages ({} bytes), received {} ({} bytes)",
        stats.messages_sent,
        stats.bytes_sent,
        stats.messages_received,
        stats.bytes_received
    );
    session.shutdown();
    tracing::info!("Played {} game(s)", played);
}
