//! Stepping orchestrator.
//!
//! Bridges the host's variable-rate frame loop to the space's fixed simulation protocol, in one
//! of two threading modes fixed at construction:
//!
//! - `Sequential`: `update(dt)` only accumulates elapsed time; `render()` performs the actual
//!   step on the calling thread, scaled by the space's speed multiplier. Stepping lives in
//!   render rather than update because some hosts call render zero or several times per update
//!   under their pacing configurations.
//! - `Background`: a dedicated thread steps the space at a fixed real-time period. The render
//!   thread only adds elapsed time into a shared atomic accumulator; the stepper thread swaps
//!   it to zero and passes the drained sum as the step's elapsed time.
//!
//! The accumulator is the one piece of cross-thread mutable state here. It is an `AtomicU32`
//! holding `f32` bits, added to with a compare-exchange loop, so no elapsed time is ever
//! dropped or double-counted between the two threads.

use crate::{debug::DebugSession, space::PhysicsSpace};
use crossbeam_channel::{bounded, select, tick, Sender};
use rigid2d::DEFAULT_STEP_FREQUENCY;
use parking_lot::Mutex;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};


/// Real-time period of the background stepping thread, independent of game speed.
const STEP_PERIOD_MICROS: u64 = (DEFAULT_STEP_FREQUENCY * 1e6) as u64;

/// Threading mode, fixed at construction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ThreadingMode {
    /// Step on the render thread, inside `render`.
    Sequential,
    /// Step on a dedicated fixed-rate thread.
    Background,
}

/// Orchestrates stepping of one `PhysicsSpace` against the host frame clock.
pub struct PhysicsStepper {
    space: Option<Arc<Mutex<PhysicsSpace>>>,
    mode: ThreadingMode,
    enabled: Arc<AtomicBool>,
    pending: Arc<AtomicU32>,
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    debug_enabled: bool,
    debug: Option<DebugSession>,
}

impl PhysicsStepper {
    /// Wrap a space and, in background mode, start the stepping thread.
    ///
    /// A thread spawn failure is fatal: it is logged and the stepper is left without a space,
    /// so every subsequent operation is a no-op. There is no fallback to sequential mode.
    pub fn new(space: PhysicsSpace, mode: ThreadingMode) -> Self {
        let space = Arc::new(Mutex::new(space));
        let enabled = Arc::new(AtomicBool::new(true));
        let pending = Arc::new(AtomicU32::new(0.0_f32.to_bits()));
        let mut stepper = PhysicsStepper {
            space: Some(space.clone()),
            mode,
            enabled: enabled.clone(),
            pending: pending.clone(),
            shutdown: None,
            thread: None,
            debug_enabled: false,
            debug: None,
        };
        if mode == ThreadingMode::Background {
            let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
            let spawned = thread::Builder::new()
                .name("planar-physics-step".to_owned())
                .spawn(move || {
                    let ticker = tick(Duration::from_micros(STEP_PERIOD_MICROS));
                    loop {
                        select! {
                            recv(ticker) -> _ => {
                                if !enabled.load(Ordering::Acquire) {
                                    continue;
                                }
                                let mut space = space.lock();
                                // re-checked under the lock, so a disable that found the
                                // lock free cannot race a step starting after it returns
                                if !enabled.load(Ordering::Acquire) {
                                    continue;
                                }
                                let dt = drain(&pending);
                                if dt <= 0.0 {
                                    continue;
                                }
                                space.update(dt);
                                space.update_fixed(dt);
                            }
                            recv(shutdown_rx) -> _ => break,
                        }
                    }
                });
            match spawned {
                Ok(handle) => {
                    stepper.shutdown = Some(shutdown_tx);
                    stepper.thread = Some(handle);
                }
                Err(e) => {
                    error!(%e, "failed to spawn physics step thread, physics is dead");
                    stepper.space = None;
                }
            }
        }
        stepper
    }

    pub fn mode(&self) -> ThreadingMode {
        self.mode
    }

    /// The stepped space, shared. `None` after `cleanup` or a fatal startup failure.
    pub fn space(&self) -> Option<Arc<Mutex<PhysicsSpace>>> {
        self.space.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Pause or resume stepping. Returns false if already in the requested state.
    ///
    /// Disabling discards accumulated time so re-enabling does not fast-forward, and in
    /// background mode does not return while a step is in flight.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let was = self.enabled.swap(enabled, Ordering::AcqRel);
        if !enabled {
            drain(&self.pending);
            if self.mode == ThreadingMode::Background {
                // the stepping thread re-checks the flag under this lock; once it is
                // acquired here, no step is running and none will start
                if let Some(space) = &self.space {
                    drop(space.lock());
                }
            }
        }
        was != enabled
    }

    /// Per-frame bookkeeping: accumulate elapsed time. Never steps. Time that passes while
    /// the stepper is disabled is discarded, not banked.
    pub fn update(&mut self, dt: f32) {
        if self.space.is_none() || !self.enabled.load(Ordering::Acquire) {
            return;
        }
        accumulate(&self.pending, dt);
    }

    /// Per-frame render callback: in sequential mode, perform the accumulated step here; in
    /// both modes, sync transforms out and service the debug session.
    pub fn render(&mut self) {
        let space = match &self.space {
            Some(space) => space,
            None => return,
        };
        if self.mode == ThreadingMode::Sequential && self.enabled.load(Ordering::Acquire) {
            let dt = drain(&self.pending);
            if dt > 0.0 {
                let mut space = space.lock();
                let scaled = dt * space.speed();
                space.update(dt);
                space.update_fixed(scaled);
            }
        }
        space.lock().render_sync();

        // debug session attaches and detaches reactively off the flag
        if self.debug_enabled && self.debug.is_none() {
            self.debug = Some(DebugSession::new());
        } else if !self.debug_enabled && self.debug.is_some() {
            self.debug = None;
        }
        if let Some(session) = &mut self.debug {
            session.refresh(&space.lock());
        }
    }

    pub fn set_debug_enabled(&mut self, enabled: bool) {
        self.debug_enabled = enabled;
    }

    /// The attached debug session, if the debug flag is set and a frame has rendered since.
    pub fn debug(&self) -> Option<&DebugSession> {
        self.debug.as_ref()
    }

    /// Shut down: stop and join the background thread, drop the debug session and the space.
    /// Body operations through this stepper are invalid afterward.
    pub fn cleanup(&mut self) {
        // dropping the sender closes the channel, which the thread treats as shutdown
        self.shutdown = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("physics step thread panicked during shutdown");
            }
        }
        self.debug = None;
        self.space = None;
    }
}

impl Drop for PhysicsStepper {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Add `dt` into the f32-bits accumulator without losing concurrent additions.
fn accumulate(cell: &AtomicU32, dt: f32) {
    let mut current = cell.load(Ordering::Relaxed);
    loop {
        let next = (f32::from_bits(current) + dt).to_bits();
        match cell.compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => break,
            Err(now) => current = now,
        }
    }
}

/// Swap the accumulator to zero and return what was in it.
fn drain(cell: &AtomicU32) -> f32 {
    f32::from_bits(cell.swap(0.0_f32.to_bits(), Ordering::AcqRel))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PhysicsBody;
    use crate::space::PhysicsSpace;
    use rigid2d::{Fixture, Shape};
    use vek::*;

    fn falling_ball_space() -> (PhysicsSpace, crate::body::BodyHandle) {
        let mut space = PhysicsSpace::new(Vec2::new(0.0, -9.8));
        let handle = space
            .add(
                PhysicsBody::rigid()
                    .position(Vec2::new(0.0, 10.0))
                    .fixture(Fixture::new(Shape::circle(1.0).unwrap())),
            )
            .unwrap();
        (space, handle)
    }

    #[test]
    fn test_sequential_steps_in_render_not_update() {
        let (space, handle) = falling_ball_space();
        let mut stepper = PhysicsStepper::new(space, ThreadingMode::Sequential);
        let space = stepper.space().unwrap();
        for _ in 0..10 {
            stepper.update(1.0 / 60.0);
        }
        // nothing stepped yet
        assert_eq!(space.lock().position(handle).unwrap().y, 10.0);
        stepper.render();
        assert!(space.lock().position(handle).unwrap().y < 10.0);
    }

    #[test]
    fn test_sequential_respects_speed_multiplier() {
        let (mut space, handle) = falling_ball_space();
        space.set_speed(0.0);
        let mut stepper = PhysicsStepper::new(space, ThreadingMode::Sequential);
        let space = stepper.space().unwrap();
        stepper.update(1.0);
        stepper.render();
        // speed zero scales the step to a settle pass
        assert_eq!(space.lock().position(handle).unwrap().y, 10.0);
    }

    #[test]
    fn test_disabled_stepper_discards_time() {
        let (space, handle) = falling_ball_space();
        let mut stepper = PhysicsStepper::new(space, ThreadingMode::Sequential);
        let space = stepper.space().unwrap();
        assert!(stepper.set_enabled(false));
        assert!(!stepper.set_enabled(false));
        stepper.update(5.0);
        stepper.render();
        assert_eq!(space.lock().position(handle).unwrap().y, 10.0);
        // time that passed while disabled was discarded, re-enabling does not fast-forward
        stepper.set_enabled(true);
        stepper.render();
        assert_eq!(space.lock().position(handle).unwrap().y, 10.0);
        // fresh time after re-enabling steps normally
        stepper.update(1.0 / 60.0);
        stepper.render();
        assert!(space.lock().position(handle).unwrap().y < 10.0);
    }

    #[test]
    fn test_background_disable_halts_stepping() {
        let (space, handle) = falling_ball_space();
        let mut stepper = PhysicsStepper::new(space, ThreadingMode::Background);
        let space = stepper.space().unwrap();
        stepper.update(0.1);
        thread::sleep(Duration::from_millis(100));
        // once this returns no step is in flight and the position is stable
        stepper.set_enabled(false);
        let y = space.lock().position(handle).unwrap().y;
        stepper.update(0.5);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(space.lock().position(handle).unwrap().y, y);
        stepper.cleanup();
    }

    #[test]
    fn test_background_thread_steps_without_render() {
        let (space, handle) = falling_ball_space();
        let mut stepper = PhysicsStepper::new(space, ThreadingMode::Background);
        let space = stepper.space().unwrap();
        stepper.update(0.1);
        // a couple of ticks worth of wall time for the thread to fire
        thread::sleep(Duration::from_millis(150));
        assert!(space.lock().position(handle).unwrap().y < 10.0);
        stepper.cleanup();
        assert!(stepper.space().is_none());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let (space, _) = falling_ball_space();
        let mut stepper = PhysicsStepper::new(space, ThreadingMode::Background);
        stepper.cleanup();
        stepper.cleanup();
        stepper.update(1.0);
        stepper.render();
    }

    #[test]
    fn test_debug_session_attaches_off_flag() {
        let (space, _) = falling_ball_space();
        let mut stepper = PhysicsStepper::new(space, ThreadingMode::Sequential);
        stepper.render();
        assert!(stepper.debug().is_none());
        stepper.set_debug_enabled(true);
        stepper.render();
        assert_eq!(stepper.debug().unwrap().len(), 1);
        stepper.set_debug_enabled(false);
        stepper.render();
        assert!(stepper.debug().is_none());
    }

    #[test]
    fn test_accumulator_add_and_drain() {
        let cell = AtomicU32::new(0.0_f32.to_bits());
        accumulate(&cell, 0.25);
        accumulate(&cell, 0.5);
        assert_eq!(drain(&cell), 0.75);
        assert_eq!(drain(&cell), 0.0);
    }
}
