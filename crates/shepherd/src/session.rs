//! # Session Orchestration
//!
//! Wires one peer together and drives its lifecycle:
//!
//! ```text
//! new() ──> [restore()] ──> establish() ──> game running ──> game_ended
//!                               ▲               │  │              │
//!                               │      pause()  │  │ lost         ▼
//!                               │               ▼  ▼       host: send_host_decision()
//!                           resume() <──── disconnected    guest: await_host_decision()
//!                           reconnect()                          │
//!                                                    PlayAgain ──┴── End
//!                                                    restart_game()   disconnect
//! ```
//!
//! The state machine lives on the loop thread while the game runs. Every
//! operation that needs it pauses the loop first and resumes it afterwards.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use shepherd_core::{
    ConnectionSignals, FrameSurface, GameLoop, InputEvent, InputSender, LoopStats, MessagePort,
    SavedSession, StateId, StateWatch, SwapSurface,
};
use shepherd_networking::{connector_for, reconnect, Connector, Message, PeerInfo, Role, Transport};

use crate::clock::{SystemClock, WallClock};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::hooks::{HookRelay, SessionHooks};
use crate::protocol::HostDecision;
use crate::states::{self, RanchDeps, RanchSnapshot};
use crate::RanchMachine;

/// Pause between liveness checks while the guest waits for the decision.
const DECISION_POLL: Duration = Duration::from_millis(100);

/// One peer of a game session.
pub struct Session {
    role: Role,
    config: SessionConfig,
    connector: Box<dyn Connector>,
    transport: Arc<Transport>,
    surface: Arc<SwapSurface>,
    deps: RanchDeps,
    game_ended: Receiver<()>,
    game_loop: GameLoop<RanchMachine>,
    /// Active state, readable without pausing the loop.
    state: StateWatch,
    /// Session to resume once connected, set by `restore`.
    pending_restore: Option<SavedSession<RanchSnapshot>>,
    established: bool,
}

impl Session {
    /// Creates the peer described by discovery.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if the configuration is invalid.
    pub fn new(
        peer: &PeerInfo,
        config: SessionConfig,
        hooks: Arc<dyn SessionHooks>,
    ) -> SessionResult<Self> {
        let connector = connector_for(peer, &config.net);
        Self::with_connector(connector, config, hooks, Arc::new(SystemClock))
    }

    /// Creates a peer around an existing connector and clock.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if the configuration is invalid.
    pub fn with_connector(
        connector: Box<dyn Connector>,
        config: SessionConfig,
        hooks: Arc<dyn SessionHooks>,
        clock: Arc<dyn WallClock>,
    ) -> SessionResult<Self> {
        config.validate()?;
        let role = connector.role();

        let signals = Arc::new(ConnectionSignals::new());
        let transport = Arc::new(Transport::new(Arc::clone(&signals), config.net.clone()));
        let (relay, game_ended) = HookRelay::new(hooks);
        let deps = RanchDeps {
            role,
            clock,
            hooks: Arc::new(relay),
            countdown: config.countdown(),
            seed: config.flock_seed,
        };

        let port: Arc<dyn MessagePort> = Arc::clone(&transport) as Arc<dyn MessagePort>;
        let mut machine = RanchMachine::new(port, config.display);
        machine.reload(states::registry(&deps));
        let state = machine.watch();

        let surface = Arc::new(SwapSurface::new());
        let frames: Arc<dyn FrameSurface> = Arc::clone(&surface) as Arc<dyn FrameSurface>;
        let game_loop = GameLoop::new(machine, &config.game_loop, signals, frames);

        tracing::info!("Session created as {}", role);
        Ok(Self {
            role,
            config,
            connector,
            transport,
            surface,
            deps,
            game_ended,
            game_loop,
            state,
            pending_restore: None,
            established: false,
        })
    }

    /// Connects to the peer (retrying per the reconnect policy), starts the
    /// state machine and the loop.
    ///
    /// A session set up with [`Session::restore`] starts disconnected and
    /// returns to the saved state on the loop's first step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyEstablished`] on a second call and
    /// [`SessionError::Net`] if the peer could not be reached.
    pub fn establish(&mut self) -> SessionResult<()> {
        if self.established {
            return Err(SessionError::AlreadyEstablished);
        }

        let hooks = Arc::clone(&self.deps.hooks);
        let stream = reconnect(self.connector.as_mut(), &self.config.reconnect, |n, max| {
            hooks.reconnecting(n, max);
        })?;
        self.transport.begin_communication(stream)?;

        let restore = self.pending_restore.take();
        let machine = self
            .game_loop
            .simulation_mut()
            .ok_or(SessionError::LoopRunning)?;
        match restore {
            Some(saved) => {
                tracing::info!("Resuming saved session in state {}", saved.current_state);
                machine.start_disconnected(saved);
                self.transport.signals().raise_recovered();
            }
            None => machine.start(None),
        }

        self.established = true;
        self.game_loop.resume();
        tracing::info!("Session established with {:?}", self.transport.peer_addr());
        Ok(())
    }

    /// Suspends the session: stops the loop, parks the game in the
    /// disconnected state and closes the connection.
    pub fn pause(&mut self) {
        self.game_loop.pause();
        if let Some(machine) = self.game_loop.simulation_mut() {
            machine.enter_disconnected();
        }
        self.transport.disconnect();
        self.connector.disconnect();
        tracing::info!("Session paused");
    }

    /// Restarts the loop, reconnecting first if the link is down.
    ///
    /// The loop runs even when reconnection fails, showing the disconnected
    /// screen.
    ///
    /// # Errors
    ///
    /// Returns the reconnection failure.
    pub fn resume(&mut self) -> SessionResult<()> {
        let result = if self.established && !self.transport.is_communicating() {
            self.reconnect()
        } else {
            Ok(())
        };
        self.game_loop.resume();
        tracing::info!("Session resumed");
        result
    }

    /// Replaces the connection with a new one and signals recovery to the
    /// loop. Does not touch the loop's running state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Net`] once every attempt failed; the game
    /// stays in the disconnected state.
    pub fn reconnect(&mut self) -> SessionResult<()> {
        self.transport.disconnect();
        let hooks = Arc::clone(&self.deps.hooks);
        let stream = reconnect(self.connector.as_mut(), &self.config.reconnect, |n, max| {
            hooks.reconnecting(n, max);
        })?;
        self.transport.begin_communication(stream)?;
        self.transport.signals().raise_recovered();
        Ok(())
    }

    /// Serializes the session for the host application to persist.
    ///
    /// While disconnected this is the parked game, not the disconnected
    /// screen. Briefly pauses a running loop.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Snapshot`] if encoding fails.
    pub fn save(&mut self) -> SessionResult<Vec<u8>> {
        if let Some(pending) = &self.pending_restore {
            return Ok(pending.to_bytes()?);
        }
        let saved = self.inspect(RanchMachine::session_for_persistence)?;
        Ok(saved.to_bytes()?)
    }

    /// Loads bytes produced by [`Session::save`]; the game resumes from them
    /// once [`Session::establish`] connects.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyEstablished`] after `establish`, and
    /// [`SessionError::Snapshot`] for bytes that do not decode.
    pub fn restore(&mut self, bytes: &[u8]) -> SessionResult<()> {
        if self.established {
            return Err(SessionError::AlreadyEstablished);
        }
        let saved = SavedSession::from_bytes(bytes)?;
        tracing::info!("Restored session parked in state {}", saved.current_state);
        self.pending_restore = Some(saved);
        Ok(())
    }

    /// Waits up to `timeout` for the current game to be decided.
    pub fn wait_for_game_end(&self, timeout: Duration) -> bool {
        self.game_ended.recv_timeout(timeout).is_ok()
    }

    /// Host only: tells the guest what happens next.
    ///
    /// `End` flushes the decision and closes the connection; `PlayAgain`
    /// starts a new game.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongRole`] on the guest.
    pub fn send_host_decision(&mut self, decision: HostDecision) -> SessionResult<()> {
        if !self.role.is_game_master() {
            return Err(SessionError::WrongRole(self.role));
        }
        tracing::info!("Host decided {:?}", decision);
        self.transport.send(Message::new(decision.encode()));

        match decision {
            HostDecision::End => {
                self.game_loop.pause();
                self.transport.disconnect_after_flush();
                self.connector.disconnect();
            }
            HostDecision::PlayAgain => {
                self.game_loop.pause();
                // Leftovers of the previous game from the guest.
                self.transport.clear_incoming();
                self.restart_game();
            }
        }
        Ok(())
    }

    /// Guest only: waits for the host's decision, skipping late game
    /// packets. Silence until the configured timeout, or the host leaving,
    /// counts as `End`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongRole`] on the host.
    pub fn await_host_decision(&mut self) -> SessionResult<HostDecision> {
        if self.role.is_game_master() {
            return Err(SessionError::WrongRole(self.role));
        }
        self.game_loop.pause();

        let deadline = Instant::now() + self.config.guest_decision_timeout();
        let decision = loop {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                tracing::warn!("No decision from the host, ending the session");
                break HostDecision::End;
            }
            match self.transport.receive_blocking(left.min(DECISION_POLL)) {
                Some(message) => match message.payload().and_then(HostDecision::decode) {
                    Some(decision) => break decision,
                    None => tracing::debug!("Skipping non-decision payload"),
                },
                None if !self.transport.is_communicating() => {
                    tracing::warn!("Host left before deciding");
                    break HostDecision::End;
                }
                None => {}
            }
        };

        tracing::info!("Guest received {:?}", decision);
        match decision {
            HostDecision::End => {
                self.transport.disconnect();
                self.connector.disconnect();
            }
            HostDecision::PlayAgain => self.restart_game(),
        }
        Ok(decision)
    }

    /// Starts a new game on the same connection with a fresh set of states.
    pub fn restart_game(&mut self) {
        self.game_loop.pause();
        self.deps.seed = self.deps.seed.map(|seed| seed.wrapping_add(1));
        if let Some(machine) = self.game_loop.simulation_mut() {
            machine.reload(states::registry(&self.deps));
            machine.restart(StateId::INITIAL);
        }
        self.game_loop.resume();
    }

    /// Runs `read` against the state machine, pausing a running loop around
    /// the call.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LoopRunning`] if the loop could not hand the
    /// machine over.
    pub fn inspect<R>(&mut self, read: impl FnOnce(&RanchMachine) -> R) -> SessionResult<R> {
        let was_running = self.game_loop.is_running();
        self.game_loop.pause();
        let result = self
            .game_loop
            .simulation()
            .map(read)
            .ok_or(SessionError::LoopRunning);
        if was_running {
            self.game_loop.resume();
        }
        result
    }

    /// The active state, if the machine has started. Never pauses the loop.
    #[must_use]
    pub fn current_state(&self) -> Option<StateId> {
        self.state.get()
    }

    /// Forwards a pointer event to the loop. Returns false if it was dropped.
    pub fn submit_input(&self, event: InputEvent) -> bool {
        self.game_loop.submit_input_event(event)
    }

    /// A producer handle for the UI thread.
    #[must_use]
    pub fn input_sender(&self) -> InputSender {
        self.game_loop.input_sender()
    }

    /// The double-buffered surface the loop renders into.
    #[must_use]
    pub fn surface(&self) -> &Arc<SwapSurface> {
        &self.surface
    }

    /// The link to the peer.
    #[must_use]
    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Loop counters, while the loop is paused.
    #[must_use]
    pub fn loop_stats(&self) -> Option<LoopStats> {
        self.game_loop.stats()
    }

    /// This peer's side of the session.
    #[inline]
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns true on the host.
    #[inline]
    #[must_use]
    pub const fn is_game_master(&self) -> bool {
        self.role.is_game_master()
    }

    /// Returns true once `establish` succeeded.
    #[inline]
    #[must_use]
    pub const fn is_established(&self) -> bool {
        self.established
    }

    /// The configuration in force.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Stops the loop and closes the connection.
    pub fn shutdown(mut self) {
        self.game_loop.pause();
        self.transport.disconnect();
        self.connector.disconnect();
        tracing::info!("Session shut down");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.transport.disconnect();
        self.connector.disconnect();
    }
}
