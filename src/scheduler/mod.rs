//! Frame scheduling - throttle, decimation, and the Idle/Running machine.
//!
//! The host's frame callback can arrive at any rate (a 120 Hz display, a
//! 1 ms test timer). [`TickGate`] turns that stream into accepted ticks at
//! the target update rate and flags every other accepted tick for a render
//! pass. [`FrameScheduler`] owns the registration against the injected
//! [`FrameSource`]: Idle → Running → Idle, with an idempotent `start` and
//! an exactly-once `cancel` on `stop`.
//!
//! # Pattern
//!
//! ```ignore
//! let mut scheduler = FrameScheduler::new(Box::new(ThreadFrameSource::new()));
//! scheduler.start(Box::new(move |now_ms| { /* tick body */ }));
//! scheduler.start(Box::new(|_| unreachable!())); // no-op while Running
//! scheduler.stop();
//! ```

mod source;

pub use source::{FrameSource, ManualFrameSource, ThreadFrameSource, TickFn, TickHandle};

use log::debug;

/// Logical update rate the gate enforces, independent of the source rate.
pub const TARGET_FPS: f64 = 30.0;

/// Minimum spacing between accepted ticks, in milliseconds.
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / TARGET_FPS;

// =============================================================================
// TickGate
// =============================================================================

/// Outcome of an accepted tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedTick {
    /// Time since the previously accepted tick, in milliseconds.
    pub delta_ms: f64,
    /// Whether this tick also runs a render pass (every other accepted
    /// tick; flicker does not need to be redrawn on every update).
    pub render: bool,
}

/// Pure throttle/decimation state for one engine instance.
#[derive(Debug)]
pub struct TickGate {
    last_tick_ms: f64,
    frames: u64,
}

impl TickGate {
    pub fn new() -> Self {
        Self {
            last_tick_ms: 0.0,
            frames: 0,
        }
    }

    /// Gate one host callback at `now_ms`.
    ///
    /// Returns `None` when the callback arrives inside the current frame
    /// interval (the simulation does not advance); otherwise advances the
    /// accepted-frame counter and reports the elapsed delta.
    pub fn accept(&mut self, now_ms: f64) -> Option<AcceptedTick> {
        let delta_ms = now_ms - self.last_tick_ms;
        if delta_ms < FRAME_INTERVAL_MS {
            return None;
        }
        self.last_tick_ms = now_ms;
        self.frames += 1;
        Some(AcceptedTick {
            delta_ms,
            render: self.frames % 2 == 0,
        })
    }

    /// Number of accepted ticks so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for TickGate {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// FrameScheduler
// =============================================================================

/// Idle/Running state machine over a [`FrameSource`] registration.
pub struct FrameScheduler {
    source: Box<dyn FrameSource>,
    handle: Option<TickHandle>,
}

impl FrameScheduler {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            handle: None,
        }
    }

    /// Begin delivering ticks. A no-op while already Running; the given
    /// callback is dropped in that case.
    pub fn start(&mut self, tick: TickFn) {
        if self.handle.is_some() {
            return;
        }
        debug!("frame scheduler running");
        self.handle = Some(self.source.request(tick));
    }

    /// Cancel the registration. A no-op while Idle; never cancels twice.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("frame scheduler idle");
            self.source.cancel(handle);
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for FrameScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Tests
// =============================================================================
