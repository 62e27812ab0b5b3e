//! # Game Loop
//!
//! Fixed-timestep "catch-up" loop on a dedicated thread.
//!
//! ```text
//! Iteration:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. MEASURE                                                          │
//! │    └─ Wall-clock gap since the previous iteration                   │
//! │                                                                     │
//! │ 2. INPUT                                                            │
//! │    └─ Drain the input queue into read_input_event()                 │
//! │                                                                     │
//! │ 3. SIMULATE (once per banked fixed step)                            │
//! │    ├─ Connection lost?      -> handle_connection_lost()             │
//! │    ├─ Connection recovered? -> handle_connection_recovered()        │
//! │    └─ update(step)                                                  │
//! │                                                                     │
//! │ 4. RENDER                                                           │
//! │    └─ acquire frame -> render() -> present (skipped if no frame)    │
//! │                                                                     │
//! │ 5. IDLE                                                             │
//! │    └─ Sleep until the next step is due                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The running flag is checked once per iteration, after the steps; the
//! idle time before a pause is still simulated, so frequent pause/resume
//! cycles do not starve the simulation. `pause()` joins the thread and hands the simulation back, so
//! saving right after it cannot race the loop.

mod step;

pub use step::FixedStep;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::LoopConfig;
use crate::input::{InputEvent, InputQueue, InputReceiver, InputSender};
use crate::render::Frame;
use crate::sync::{ConnectionSignals, FrameSurface};

/// Whatever the loop drives.
///
/// Every method runs on the loop thread.
pub trait Simulation: Send + 'static {
    /// The loop thread started.
    fn on_loop_start(&mut self) {}

    /// The loop thread is about to exit.
    fn on_loop_end(&mut self) {}

    /// A queued input event.
    fn read_input_event(&mut self, event: InputEvent);

    /// One fixed step.
    fn update(&mut self, step: Duration);

    /// Records the current frame.
    fn render(&mut self, frame: &mut Frame);

    /// The peer went away (sampled before the step's update).
    fn handle_connection_lost(&mut self) {}

    /// The connection was re-established (sampled after the lost signal).
    fn handle_connection_recovered(&mut self) {}
}

/// Loop counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Outer iterations.
    pub iterations: u64,
    /// Fixed steps simulated.
    pub steps: u64,
    /// Frames rendered and presented.
    pub frames_rendered: u64,
    /// Iterations that found no frame to render into.
    pub frames_skipped: u64,
    /// Input events dispatched.
    pub inputs_dispatched: u64,
    /// Connection-lost signals handled.
    pub losses_handled: u64,
    /// Connection-recovered signals handled.
    pub recoveries_handled: u64,
}

/// Everything the loop thread owns while running.
struct Driver<S> {
    simulation: S,
    clock: FixedStep,
    inputs: InputReceiver,
    signals: Arc<ConnectionSignals>,
    surface: Arc<dyn FrameSurface>,
    stats: LoopStats,
}

impl<S: Simulation> Driver<S> {
    /// One loop iteration over an `elapsed` wall-clock gap.
    fn iterate(&mut self, elapsed: Duration) {
        self.stats.iterations += 1;

        let simulation = &mut self.simulation;
        let dispatched = self.inputs.drain(|event| simulation.read_input_event(event));
        self.stats.inputs_dispatched += dispatched as u64;

        self.clock.accumulate(elapsed);
        while self.clock.should_step() {
            let step = self.clock.consume_step();

            if self.signals.take_lost() {
                self.stats.losses_handled += 1;
                self.simulation.handle_connection_lost();
            }
            if self.signals.take_recovered() {
                self.stats.recoveries_handled += 1;
                self.simulation.handle_connection_recovered();
            }

            self.simulation.update(step);
            self.stats.steps += 1;
        }

        match self.surface.acquire() {
            Some(mut frame) => {
                self.simulation.render(&mut frame);
                self.surface.present(frame);
                self.stats.frames_rendered += 1;
            }
            None => self.stats.frames_skipped += 1,
        }
    }

    /// Thread body. Returns the driver so the owner gets the simulation back.
    fn run(mut self, running: &AtomicBool) -> Self {
        tracing::info!("Game loop started");
        self.simulation.on_loop_start();

        // Each idle sleep is measured by the iteration that follows it, even
        // when a pause arrives meanwhile.
        let mut last = Instant::now();
        loop {
            let now = Instant::now();
            self.iterate(now.duration_since(last));
            last = now;

            if !running.load(Ordering::Acquire) {
                break;
            }
            let idle = self.clock.time_until_next_step();
            if !idle.is_zero() {
                thread::sleep(idle);
            }
        }

        self.simulation.on_loop_end();
        tracing::info!(
            "Game loop stopped after {} iterations, {} steps",
            self.stats.iterations,
            self.stats.steps
        );
        self
    }
}

/// The real-time scheduler.
pub struct GameLoop<S: Simulation> {
    /// The driver while paused.
    driver: Option<Driver<S>>,
    /// The loop thread while running.
    thread: Option<JoinHandle<Driver<S>>>,
    running: Arc<AtomicBool>,
    input: InputQueue,
    signals: Arc<ConnectionSignals>,
}

impl<S: Simulation> GameLoop<S> {
    /// Creates a paused loop around `simulation`.
    ///
    /// # Panics
    ///
    /// Panics if `config.target_fps` is zero.
    #[must_use]
    pub fn new(
        simulation: S,
        config: &LoopConfig,
        signals: Arc<ConnectionSignals>,
        surface: Arc<dyn FrameSurface>,
    ) -> Self {
        let input = InputQueue::new(config.input_queue_capacity);
        let driver = Driver {
            simulation,
            clock: FixedStep::new(config.target_fps).with_max_frame_time(config.max_frame_time()),
            inputs: input.receiver(),
            signals: Arc::clone(&signals),
            surface,
            stats: LoopStats::default(),
        };
        Self {
            driver: Some(driver),
            thread: None,
            running: Arc::new(AtomicBool::new(false)),
            input,
            signals,
        }
    }

    /// Starts the loop thread. Does nothing if already running.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn the thread.
    pub fn resume(&mut self) {
        let Some(driver) = self.driver.take() else {
            return;
        };
        self.running.store(true, Ordering::Release);
        self.input.set_open(true);

        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("shepherd-loop".into())
            .spawn(move || driver.run(&running))
            .expect("Failed to spawn game loop thread");
        self.thread = Some(handle);
    }

    /// Stops the loop thread and waits for it to exit.
    ///
    /// Input is refused from this point on. Does nothing if already paused.
    ///
    /// # Panics
    ///
    /// Re-raises a panic that happened on the loop thread.
    pub fn pause(&mut self) {
        self.input.set_open(false);
        self.running.store(false, Ordering::Release);

        let Some(handle) = self.thread.take() else {
            return;
        };
        match handle.join() {
            Ok(driver) => self.driver = Some(driver),
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    /// Returns true while the loop thread runs.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Runs one iteration on the calling thread.
    ///
    /// Only works while paused; returns false if the loop thread owns the
    /// simulation.
    pub fn iterate(&mut self, elapsed: Duration) -> bool {
        match self.driver.as_mut() {
            Some(driver) => {
                driver.iterate(elapsed);
                true
            }
            None => false,
        }
    }

    /// Submits an input event (non-blocking).
    ///
    /// Returns false if the loop is paused or the queue is full.
    pub fn submit_input_event(&self, event: InputEvent) -> bool {
        self.input.sender().submit(event)
    }

    /// A cloneable producer handle for the UI thread.
    #[must_use]
    pub fn input_sender(&self) -> InputSender {
        self.input.sender()
    }

    /// The connection signals sampled by this loop.
    #[must_use]
    pub fn signals(&self) -> &Arc<ConnectionSignals> {
        &self.signals
    }

    /// Reports that the peer went away.
    pub fn signal_connection_lost(&self) {
        self.signals.raise_lost();
    }

    /// Reports that the connection came back.
    pub fn signal_connection_recovered(&self) {
        self.signals.raise_recovered();
    }

    /// The simulation, while paused.
    #[must_use]
    pub fn simulation(&self) -> Option<&S> {
        self.driver.as_ref().map(|driver| &driver.simulation)
    }

    /// The simulation, mutably, while paused.
    pub fn simulation_mut(&mut self) -> Option<&mut S> {
        self.driver.as_mut().map(|driver| &mut driver.simulation)
    }

    /// Loop counters, while paused.
    #[must_use]
    pub fn stats(&self) -> Option<LoopStats> {
        self.driver.as_ref().map(|driver| driver.stats)
    }

    /// Stops the loop and returns the simulation.
    ///
    /// # Panics
    ///
    /// Re-raises a panic that happened on the loop thread.
    #[must_use]
    pub fn into_simulation(mut self) -> Option<S> {
        self.pause();
        self.driver.take().map(|driver| driver.simulation)
    }
}

impl<S: Simulation> Drop for GameLoop<S> {
    fn drop(&mut self) {
        self.input.set_open(false);
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            // A panic on the loop thread is not re-raised while dropping.
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputKind;
    use crate::sync::SwapSurface;
    use parking_lot::Mutex;

    /// Records the order of calls.
    #[derive(Default)]
    struct Counting {
        calls: Vec<&'static str>,
        updates: u32,
        renders: u32,
        inputs: Vec<InputKind>,
        last_step: Duration,
    }

    impl Simulation for Counting {
        fn read_input_event(&mut self, event: InputEvent) {
            self.calls.push("input");
            self.inputs.push(event.kind);
        }

        fn update(&mut self, step: Duration) {
            self.calls.push("update");
            self.updates += 1;
            self.last_step = step;
        }

        fn render(&mut self, _frame: &mut Frame) {
            self.calls.push("render");
            self.renders += 1;
        }

        fn handle_connection_lost(&mut self) {
            self.calls.push("lost");
        }

        fn handle_connection_recovered(&mut self) {
            self.calls.push("recovered");
        }
    }

    fn driver(surface: Arc<SwapSurface>) -> (Driver<Counting>, InputQueue) {
        let queue = InputQueue::new(16);
        queue.set_open(true);
        let driver = Driver {
            simulation: Counting::default(),
            clock: FixedStep::new(60),
            inputs: queue.receiver(),
            signals: Arc::new(ConnectionSignals::new()),
            surface,
            stats: LoopStats::default(),
        };
        (driver, queue)
    }

    #[test]
    fn test_catch_up_runs_21_steps_then_one_render() {
        let (mut driver, _queue) = driver(Arc::new(SwapSurface::new()));
        driver.iterate(Duration::from_millis(350));

        assert_eq!(driver.simulation.updates, 21);
        assert_eq!(driver.simulation.renders, 1);
        assert_eq!(driver.simulation.calls.last(), Some(&"render"));
        assert_eq!(driver.simulation.last_step, Duration::from_nanos(16_666_666));
        assert_eq!(driver.clock.remainder(), Duration::from_nanos(14));

        // The carried remainder completes the next step exactly.
        driver.iterate(Duration::from_nanos(16_666_652));
        assert_eq!(driver.simulation.updates, 22);
        assert_eq!(driver.clock.remainder(), Duration::ZERO);
    }

    #[test]
    fn test_inputs_dispatched_before_steps() {
        let (mut driver, queue) = driver(Arc::new(SwapSurface::new()));
        let sender = queue.sender();
        assert!(sender.submit(InputEvent::down(1.0, 1.0)));
        assert!(sender.submit(InputEvent::up(1.0, 1.0)));

        driver.iterate(Duration::from_millis(20));

        assert_eq!(driver.simulation.calls, vec!["input", "input", "update", "render"]);
        assert_eq!(driver.simulation.inputs, vec![InputKind::Down, InputKind::Up]);
        assert_eq!(driver.stats.inputs_dispatched, 2);
    }

    #[test]
    fn test_signals_sampled_once_before_update() {
        let (mut driver, _queue) = driver(Arc::new(SwapSurface::new()));
        driver.signals.raise_lost();
        driver.signals.raise_lost();
        driver.signals.raise_recovered();

        driver.iterate(Duration::from_millis(40));

        assert_eq!(
            driver.simulation.calls,
            vec!["lost", "recovered", "update", "update", "render"]
        );
        assert_eq!(driver.stats.losses_handled, 1);
        assert_eq!(driver.stats.recoveries_handled, 1);
    }

    #[test]
    fn test_signals_wait_for_a_step() {
        let (mut driver, _queue) = driver(Arc::new(SwapSurface::new()));
        driver.signals.raise_lost();

        driver.iterate(Duration::from_millis(5));
        assert_eq!(driver.simulation.calls, vec!["render"]);
        assert!(driver.signals.is_lost_pending());

        driver.iterate(Duration::from_millis(15));
        assert_eq!(driver.simulation.calls, vec!["render", "lost", "update", "render"]);
    }

    #[test]
    fn test_render_skipped_without_frame() {
        let surface = Arc::new(SwapSurface::new());
        surface.set_available(false);
        let (mut driver, _queue) = driver(Arc::clone(&surface));

        driver.iterate(Duration::from_millis(20));

        assert_eq!(driver.simulation.renders, 0);
        assert_eq!(driver.stats.frames_skipped, 1);
        assert_eq!(driver.simulation.updates, 1);
    }

    #[test]
    fn test_paused_loop_refuses_input() {
        let game_loop = GameLoop::new(
            Counting::default(),
            &LoopConfig::default(),
            Arc::new(ConnectionSignals::new()),
            Arc::new(SwapSurface::new()),
        );
        assert!(!game_loop.submit_input_event(InputEvent::down(0.0, 0.0)));
    }

    #[test]
    fn test_manual_iteration_while_paused() {
        let mut game_loop = GameLoop::new(
            Counting::default(),
            &LoopConfig::default(),
            Arc::new(ConnectionSignals::new()),
            Arc::new(SwapSurface::new()),
        );
        assert!(game_loop.iterate(Duration::from_millis(350)));
        assert_eq!(game_loop.simulation().map(|counting| counting.updates), Some(21));
        assert_eq!(game_loop.stats().map(|stats| stats.frames_rendered), Some(1));
    }

    /// Counts loop-thread activity through shared state.
    struct Shared(Arc<Mutex<(u32, u32)>>);

    impl Simulation for Shared {
        fn read_input_event(&mut self, _event: InputEvent) {
            self.0.lock().1 += 1;
        }

        fn update(&mut self, _step: Duration) {
            self.0.lock().0 += 1;
        }

        fn render(&mut self, _frame: &mut Frame) {}
    }

    #[test]
    fn test_resume_pause_roundtrip() {
        let counters = Arc::new(Mutex::new((0, 0)));
        let surface = Arc::new(SwapSurface::new());
        let mut game_loop = GameLoop::new(
            Shared(Arc::clone(&counters)),
            &LoopConfig::default(),
            Arc::new(ConnectionSignals::new()),
            Arc::clone(&surface) as Arc<dyn FrameSurface>,
        );

        game_loop.resume();
        assert!(game_loop.is_running());
        assert!(game_loop.simulation().is_none());
        assert!(game_loop.submit_input_event(InputEvent::down(1.0, 1.0)));

        thread::sleep(Duration::from_millis(150));
        game_loop.pause();

        assert!(!game_loop.is_running());
        assert!(game_loop.simulation().is_some());
        let (updates, inputs) = *counters.lock();
        assert!(updates > 0);
        assert_eq!(inputs, 1);
        assert!(surface.frame_count() > 0);

        // Nothing moves once paused.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(counters.lock().0, updates);
        assert!(!game_loop.submit_input_event(InputEvent::up(1.0, 1.0)));

        // And it picks up again.
        game_loop.resume();
        thread::sleep(Duration::from_millis(50));
        game_loop.pause();
        assert!(counters.lock().0 > updates);
    }

    #[test]
    fn test_frequent_pause_resume_still_steps() {
        let counters = Arc::new(Mutex::new((0, 0)));
        let mut game_loop = GameLoop::new(
            Shared(Arc::clone(&counters)),
            &LoopConfig::default(),
            Arc::new(ConnectionSignals::new()),
            Arc::new(SwapSurface::new()),
        );

        // A UI thread polling the simulation between short runs.
        for _ in 0..40 {
            game_loop.resume();
            thread::sleep(Duration::from_millis(10));
            game_loop.pause();
        }

        let stats = game_loop.stats().unwrap();
        assert_eq!(stats.steps, u64::from(counters.lock().0));
        assert!(stats.steps >= 20, "only {} steps in 40 cycles", stats.steps);
    }

    #[test]
    fn test_loop_thread_is_named() {
        struct Named(Arc<Mutex<Option<String>>>);

        impl Simulation for Named {
            fn on_loop_start(&mut self) {
                *self.0.lock() = thread::current().name().map(str::to_owned);
            }

            fn read_input_event(&mut self, _event: InputEvent) {}

            fn update(&mut self, _step: Duration) {}

            fn render(&mut self, _frame: &mut Frame) {}
        }

        let name = Arc::new(Mutex::new(None));
        let mut game_loop = GameLoop::new(
            Named(Arc::clone(&name)),
            &LoopConfig::default(),
            Arc::new(ConnectionSignals::new()),
            Arc::new(SwapSurface::new()),
        );
        game_loop.resume();
        game_loop.pause();
        assert_eq!(name.lock().as_deref(), Some("shepherd-loop"));
    }
}
