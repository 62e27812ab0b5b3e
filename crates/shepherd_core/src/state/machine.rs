//! # State Machine
//!
//! Drives the active state and performs ordered transitions:
//!
//! 1. `on_state_end()` on the current state
//! 2. `current` becomes the target id
//! 3. `on_state_start()` on the target state
//!
//! Targets must be registered. Switching to an unknown id is a wiring bug and
//! panics instead of being ignored.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{Entry, SavedSession, State, StateContext, StateId, StateWatch, Transition};
use crate::config::DisplayContext;
use crate::game_loop::Simulation;
use crate::input::InputEvent;
use crate::port::MessagePort;
use crate::render::Frame;

/// The game-phase driver.
///
/// Owned by the simulation thread while the loop runs; it adds no
/// synchronization of its own.
pub struct StateMachine<A, S> {
    /// Registered states.
    states: HashMap<StateId, Box<dyn State<A, S>>>,
    /// Active state, `None` before `start()`.
    current: Option<StateId>,
    /// Link to the peer.
    port: Arc<dyn MessagePort>,
    /// Screen geometry handed to every hook.
    display: DisplayContext,
    /// Where to go back to once the connection recovers.
    lost_session: Option<SavedSession<S>>,
    /// `current`, published for other threads.
    watch: StateWatch,
}

impl<A: 'static, S: 'static> StateMachine<A, S> {
    /// Creates an empty machine talking to the peer through `port`.
    #[must_use]
    pub fn new(port: Arc<dyn MessagePort>, display: DisplayContext) -> Self {
        Self {
            states: HashMap::new(),
            current: None,
            port,
            display,
            lost_session: None,
            watch: StateWatch::new(),
        }
    }

    /// Registers `state` under `id`, replacing any previous entry.
    pub fn register(&mut self, id: StateId, state: impl State<A, S> + 'static) -> &mut Self {
        self.states.insert(id, Box::new(state));
        self
    }

    /// Replaces the whole registry (new game in the same session).
    pub fn reload(&mut self, states: impl IntoIterator<Item = (StateId, Box<dyn State<A, S>>)>) {
        self.states = states.into_iter().collect();
        tracing::debug!("State registry reloaded with {} states", self.states.len());
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn is_registered(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    /// Returns the active state id.
    #[inline]
    #[must_use]
    pub const fn current_id(&self) -> Option<StateId> {
        self.current
    }

    /// A handle that follows the active state id from any thread.
    #[must_use]
    pub fn watch(&self) -> StateWatch {
        self.watch.clone()
    }

    /// Returns true once `start()` has run.
    #[inline]
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.current.is_some()
    }

    /// Screen geometry handed to the states.
    #[must_use]
    pub const fn display(&self) -> &DisplayContext {
        &self.display
    }

    /// The session saved when the connection was lost, if any.
    #[must_use]
    pub const fn lost_session(&self) -> Option<&SavedSession<S>> {
        self.lost_session.as_ref()
    }

    /// Enters the first state.
    ///
    /// Starts in the saved state (handing it the saved payload) or in
    /// [`StateId::INITIAL`].
    ///
    /// # Panics
    ///
    /// Panics if the machine was already started or the start state is not
    /// registered.
    pub fn start(&mut self, saved: Option<SavedSession<S>>) {
        let (target, snapshot) = match saved {
            Some(saved) => (saved.current_state, saved.payload),
            None => (StateId::INITIAL, None),
        };
        self.begin(target);
        let next = self.invoke(target, move |state, ctx| {
            state.on_state_start(ctx, Entry::Start { snapshot });
        });
        self.settle(next);
    }

    /// Enters [`StateId::DISCONNECTED`] and keeps `saved` until the
    /// connection recovers.
    ///
    /// Used when a process that was mid-game is recreated: the game resumes
    /// only once the peer is back.
    ///
    /// # Panics
    ///
    /// Panics if the machine was already started or no disconnected state is
    /// registered.
    pub fn start_disconnected(&mut self, saved: SavedSession<S>) {
        self.begin(StateId::DISCONNECTED);
        self.lost_session = Some(saved);
        let next = self.invoke(StateId::DISCONNECTED, |state, ctx| {
            state.on_state_start(ctx, Entry::Start { snapshot: None });
        });
        self.settle(next);
    }

    /// Switches to `target`.
    ///
    /// # Panics
    ///
    /// Panics if `target` is not registered.
    pub fn switch(&mut self, target: StateId, args: Option<A>, snapshot: Option<S>) {
        let next = self.transition(target, args, snapshot);
        self.settle(next);
    }

    /// Re-enters `initial` for a new game in the same session.
    ///
    /// The previous state's `on_state_end` is not invoked and any session
    /// saved for connection recovery is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `initial` is not registered.
    pub fn restart(&mut self, initial: StateId) {
        assert!(
            self.states.contains_key(&initial),
            "cannot restart in unregistered state {initial}"
        );
        tracing::info!("State machine restarted in state {}", initial);
        self.lost_session = None;
        self.set_current(initial);
        let next = self.invoke(initial, |state, ctx| state.on_state_start(ctx, Entry::Restart));
        self.settle(next);
    }

    /// Captures the active state.
    #[must_use]
    pub fn save(&self) -> SavedSession<S> {
        let current_state = self.current.unwrap_or(StateId::INITIAL);
        let payload = self
            .states
            .get(&current_state)
            .and_then(|state| state.on_state_save());
        SavedSession {
            current_state,
            payload,
        }
    }

    /// Leaves the active state for [`StateId::DISCONNECTED`], saving it so
    /// that [`StateMachine::recover`] can return to it.
    ///
    /// Does nothing if already disconnected or not started.
    pub fn enter_disconnected(&mut self) {
        match self.current {
            None | Some(StateId::DISCONNECTED) => {}
            Some(_) => {
                self.lost_session = Some(self.save());
                tracing::warn!("Connection lost, parking the session");
                self.switch(StateId::DISCONNECTED, None, None);
            }
        }
    }

    /// Returns from [`StateId::DISCONNECTED`] to the parked session, or to
    /// [`StateId::INITIAL`] when nothing was parked.
    ///
    /// Does nothing unless the machine is disconnected.
    pub fn recover(&mut self) {
        if self.current != Some(StateId::DISCONNECTED) {
            tracing::debug!("Recovery ignored, state machine is not disconnected");
            return;
        }
        let saved = self
            .lost_session
            .take()
            .unwrap_or_else(|| SavedSession::at(StateId::INITIAL));
        tracing::info!("Connection recovered, resuming state {}", saved.current_state);
        self.switch(saved.current_state, None, saved.payload);
    }

    /// Feeds queued peer messages to the active state while it accepts them.
    fn pump_incoming(&mut self) {
        while let Some(current) = self.current {
            let accepts = self
                .states
                .get(&current)
                .is_some_and(|state| state.accepts_network_messages());
            if !accepts {
                break;
            }
            let Some(payload) = self.port.poll_incoming() else {
                break;
            };
            let next = self.invoke(current, |state, ctx| {
                state.read_network_message(ctx, &payload);
            });
            self.settle(next);
        }
    }

    fn set_current(&mut self, id: StateId) {
        self.current = Some(id);
        self.watch.publish(self.current);
    }

    fn begin(&mut self, target: StateId) {
        assert!(self.current.is_none(), "state machine already started");
        assert!(
            self.states.contains_key(&target),
            "cannot start in unregistered state {target}"
        );
        tracing::info!("State machine started in state {}", target);
        self.set_current(target);
    }

    fn transition(
        &mut self,
        target: StateId,
        args: Option<A>,
        snapshot: Option<S>,
    ) -> Option<Transition<A, S>> {
        assert!(
            self.states.contains_key(&target),
            "cannot switch to unregistered state {target}"
        );

        if let Some(current) = self.current {
            if let Some(state) = self.states.get_mut(&current) {
                state.on_state_end();
                while let Some(payload) = state.produce_outgoing_network_message() {
                    self.port.post(payload);
                }
            }
            tracing::info!("State transition: {} -> {}", current, target);
        }

        self.set_current(target);
        self.invoke(target, move |state, ctx| {
            state.on_state_start(ctx, Entry::Switch { args, snapshot });
        })
    }

    /// Applies transitions until no state asks for another one.
    fn settle(&mut self, mut pending: Option<Transition<A, S>>) {
        while let Some(Transition {
            target,
            args,
            snapshot,
        }) = pending
        {
            pending = self.transition(target, args, snapshot);
        }
    }

    /// Runs one hook on state `id`, flushes what it wants to send and returns
    /// the transition it requested.
    fn invoke<F>(&mut self, id: StateId, hook: F) -> Option<Transition<A, S>>
    where
        F: FnOnce(&mut dyn State<A, S>, &mut StateContext<'_, A, S>),
    {
        let state = self.states.get_mut(&id)?;
        let mut ctx = StateContext::new(id, &self.display);
        hook(state.as_mut(), &mut ctx);
        while let Some(payload) = state.produce_outgoing_network_message() {
            self.port.post(payload);
        }
        ctx.into_transition()
    }
}

impl<A: Clone + 'static, S: Clone + 'static> StateMachine<A, S> {
    /// The session worth persisting: the parked one while disconnected,
    /// otherwise the active state.
    #[must_use]
    pub fn session_for_persistence(&self) -> SavedSession<S> {
        match (&self.lost_session, self.current) {
            (Some(parked), Some(StateId::DISCONNECTED)) => parked.clone(),
            _ => self.save(),
        }
    }
}

impl<A, S> Simulation for StateMachine<A, S>
where
    A: Send + 'static,
    S: Send + 'static,
{
    fn read_input_event(&mut self, event: InputEvent) {
        if let Some(current) = self.current {
            let next = self.invoke(current, |state, ctx| state.read_input_event(ctx, event));
            self.settle(next);
        }
    }

    fn update(&mut self, step: Duration) {
        self.pump_incoming();
        if let Some(current) = self.current {
            let dt = step.as_secs_f32();
            let next = self.invoke(current, |state, ctx| state.update(ctx, dt));
            self.settle(next);
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        if let Some(current) = self.current {
            let next = self.invoke(current, |state, ctx| state.render(ctx, frame));
            self.settle(next);
        }
    }

    fn handle_connection_lost(&mut self) {
        self.enter_disconnected();
    }

    fn handle_connection_recovered(&mut self) {
        self.recover();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::ChannelPort;
    use parking_lot::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records every hook call as `name:hook`.
    struct Recorder {
        name: &'static str,
        log: Log,
        accepts: bool,
        outbox: Vec<Vec<u8>>,
        next_on_update: Option<StateId>,
        saved: Option<u32>,
    }

    impl Recorder {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                accepts: false,
                outbox: Vec::new(),
                next_on_update: None,
                saved: None,
            }
        }

        fn push(&self, event: impl AsRef<str>) {
            self.log.lock().push(format!("{}:{}", self.name, event.as_ref()));
        }
    }

    impl State<&'static str, u32> for Recorder {
        fn on_state_start(
            &mut self,
            ctx: &mut StateContext<'_, &'static str, u32>,
            entry: Entry<&'static str, u32>,
        ) {
            match entry {
                Entry::Start { snapshot } => self.push(format!("start({snapshot:?})@{}", ctx.state_id())),
                Entry::Switch { args, snapshot } => {
                    self.saved = snapshot;
                    self.push(format!("switch({args:?},{snapshot:?})@{}", ctx.state_id()));
                }
                Entry::Restart => self.push("restart"),
            }
        }

        fn on_state_save(&self) -> Option<u32> {
            self.saved
        }

        fn on_state_end(&mut self) {
            self.push("end");
            self.outbox.push(format!("bye from {}", self.name).into_bytes());
        }

        fn update(&mut self, ctx: &mut StateContext<'_, &'static str, u32>, _dt: f32) {
            self.push("update");
            if let Some(next) = self.next_on_update.take() {
                ctx.switch_with(next, "from-update");
            }
        }

        fn accepts_network_messages(&self) -> bool {
            self.accepts
        }

        fn read_network_message(&mut self, _ctx: &mut StateContext<'_, &'static str, u32>, payload: &[u8]) {
            self.push(format!("net({})", String::from_utf8_lossy(payload)));
        }

        fn produce_outgoing_network_message(&mut self) -> Option<Vec<u8>> {
            self.outbox.pop()
        }
    }

    fn machine(log: &Log) -> (StateMachine<&'static str, u32>, ChannelPort) {
        let (ours, theirs) = ChannelPort::pair();
        let mut machine = StateMachine::new(Arc::new(ours), DisplayContext::default());
        machine
            .register(StateId::INITIAL, Recorder::new("a", log))
            .register(StateId(1), Recorder::new("b", log))
            .register(StateId::DISCONNECTED, Recorder::new("off", log));
        (machine, theirs)
    }

    #[test]
    fn test_watch_follows_transitions_across_threads() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        let watch = machine.watch();
        assert_eq!(watch.get(), None);

        machine.start(None);
        assert_eq!(watch.get(), Some(StateId::INITIAL));

        machine.switch(StateId(1), None, Some(7));
        let reader = watch.clone();
        let seen = std::thread::spawn(move || reader.get()).join().unwrap();
        assert_eq!(seen, Some(StateId(1)));

        machine.enter_disconnected();
        assert_eq!(watch.get(), Some(StateId::DISCONNECTED));
        machine.restart(StateId::INITIAL);
        assert_eq!(watch.get(), Some(StateId::INITIAL));
    }

    #[test]
    fn test_start_enters_initial() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(None);

        assert_eq!(machine.current_id(), Some(StateId::INITIAL));
        assert_eq!(*log.lock(), vec!["a:start(None)@initial"]);
    }

    #[test]
    fn test_transition_ordering() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(None);
        machine.switch(StateId(1), Some("go"), None);
        machine.switch(StateId::INITIAL, None, Some(5));

        assert_eq!(
            *log.lock(),
            vec![
                "a:start(None)@initial",
                "a:end",
                "b:switch(Some(\"go\"),None)@#1",
                "b:end",
                "a:switch(None,Some(5))@initial",
            ]
        );
    }

    #[test]
    #[should_panic(expected = "unregistered state")]
    fn test_unknown_state_is_fatal() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(None);
        machine.switch(StateId(99_999), None, None);
    }

    #[test]
    #[should_panic(expected = "already started")]
    fn test_double_start_is_fatal() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(None);
        machine.start(None);
    }

    #[test]
    #[should_panic(expected = "unregistered state")]
    fn test_start_in_unknown_state_is_fatal() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(Some(SavedSession::at(StateId(42))));
    }

    #[test]
    fn test_hook_requested_transition_applies_after_hook() {
        let log = Log::default();
        let (ours, _theirs) = ChannelPort::pair();
        let mut machine = StateMachine::new(Arc::new(ours), DisplayContext::default());
        let mut first = Recorder::new("a", &log);
        first.next_on_update = Some(StateId(1));
        machine
            .register(StateId::INITIAL, first)
            .register(StateId(1), Recorder::new("b", &log));
        machine.start(None);

        machine.update(Duration::from_millis(16));

        assert_eq!(machine.current_id(), Some(StateId(1)));
        assert_eq!(
            *log.lock(),
            vec![
                "a:start(None)@initial",
                "a:update",
                "a:end",
                "b:switch(Some(\"from-update\"),None)@#1",
            ]
        );
    }

    #[test]
    fn test_outgoing_flushed_before_switch() {
        let log = Log::default();
        let (mut machine, peer) = machine(&log);
        machine.start(None);
        machine.switch(StateId(1), None, None);

        assert_eq!(peer.poll_incoming(), Some(b"bye from a".to_vec()));
    }

    #[test]
    fn test_messages_only_reach_accepting_states() {
        let log = Log::default();
        let (ours, peer) = ChannelPort::pair();
        let mut machine = StateMachine::new(Arc::new(ours), DisplayContext::default());
        let mut listener = Recorder::new("a", &log);
        listener.accepts = true;
        machine
            .register(StateId::INITIAL, listener)
            .register(StateId(1), Recorder::new("b", &log));
        machine.start(None);

        peer.post(b"one".to_vec());
        peer.post(b"two".to_vec());
        machine.update(Duration::from_millis(16));
        machine.switch(StateId(1), None, None);
        peer.post(b"three".to_vec());
        machine.update(Duration::from_millis(16));

        let log = log.lock();
        assert!(log.contains(&"a:net(one)".to_string()));
        assert!(log.contains(&"a:net(two)".to_string()));
        assert!(!log.iter().any(|line| line.contains("three")));
        drop(log);
        // Still queued for whoever reads the link directly.
        assert_eq!(machine.port.poll_incoming(), Some(b"three".to_vec()));
    }

    #[test]
    fn test_restart_skips_end_hook() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(None);
        machine.switch(StateId(1), None, None);
        log.lock().clear();

        machine.restart(StateId::INITIAL);

        assert_eq!(*log.lock(), vec!["a:restart"]);
        assert_eq!(machine.current_id(), Some(StateId::INITIAL));
    }

    #[test]
    fn test_lost_then_recovered_returns_to_saved_state() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(None);
        machine.switch(StateId(1), None, Some(77));

        machine.handle_connection_lost();
        assert_eq!(machine.current_id(), Some(StateId::DISCONNECTED));
        assert_eq!(
            machine.lost_session(),
            Some(&SavedSession {
                current_state: StateId(1),
                payload: Some(77)
            })
        );
        assert_eq!(machine.session_for_persistence().current_state, StateId(1));

        // A second loss while parked keeps the original session.
        machine.handle_connection_lost();
        assert_eq!(machine.lost_session().map(|s| s.current_state), Some(StateId(1)));

        machine.handle_connection_recovered();
        assert_eq!(machine.current_id(), Some(StateId(1)));
        assert!(machine.lost_session().is_none());
        assert_eq!(machine.save().payload, Some(77));
    }

    #[test]
    fn test_recovery_without_parked_session_goes_initial() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(Some(SavedSession::at(StateId::DISCONNECTED)));

        machine.handle_connection_recovered();
        assert_eq!(machine.current_id(), Some(StateId::INITIAL));
    }

    #[test]
    fn test_recovery_ignored_when_connected() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start(None);
        machine.handle_connection_recovered();
        assert_eq!(machine.current_id(), Some(StateId::INITIAL));
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_start_disconnected_resumes_saved_game() {
        let log = Log::default();
        let (mut machine, _peer) = machine(&log);
        machine.start_disconnected(SavedSession {
            current_state: StateId(1),
            payload: Some(3),
        });
        assert_eq!(machine.current_id(), Some(StateId::DISCONNECTED));

        machine.recover();
        assert_eq!(machine.current_id(), Some(StateId(1)));
        assert!(log.lock().contains(&"b:switch(None,Some(3))@#1".to_string()));
    }
}
