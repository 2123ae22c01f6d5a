//! Frame sources - the injected "next frame" callback primitive.
//!
//! A [`FrameSource`] delivers monotonic millisecond timestamps to a tick
//! callback, repeatedly, until the handle is cancelled. The engine never
//! owns a timer of its own; it only reacts to whatever cadence the source
//! provides and throttles internally (see [`TickGate`](super::TickGate)).
//!
//! Two sources ship with the crate:
//!
//! - [`ThreadFrameSource`] - a background-thread timer for hosts without
//!   their own frame loop
//! - [`ManualFrameSource`] - host-driven; `fire` delivers a tick
//!   synchronously, which is also what the test suite runs on

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Tick callback fed by a frame source. Receives a timestamp in
/// milliseconds against the source's own epoch.
pub type TickFn = Box<dyn FnMut(f64) + Send>;

/// Identifies one active callback registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

/// Recurring frame-callback capability.
pub trait FrameSource: Send {
    /// Begin delivering ticks to `tick`. Delivery continues until the
    /// returned handle is cancelled.
    fn request(&mut self, tick: TickFn) -> TickHandle;

    /// Stop delivery for `handle`. After this returns, the callback body
    /// no longer runs (a thread source may be mid-sleep; it re-checks its
    /// flag before firing).
    fn cancel(&mut self, handle: TickHandle);
}

// =============================================================================
// ThreadFrameSource
// =============================================================================

/// Frame source backed by a dedicated timer thread per registration.
///
/// The thread sleeps at the configured native cadence and fires the
/// callback with the elapsed time since the source was created. The
/// default cadence (~120 Hz) intentionally outpaces the engine's 30 fps
/// target so the internal throttle, not the source, sets the update rate.
pub struct ThreadFrameSource {
    interval: Duration,
    epoch: Instant,
    next_id: u64,
    active: HashMap<TickHandle, Arc<AtomicBool>>,
}

impl ThreadFrameSource {
    /// Source ticking at roughly 120 Hz.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_micros(8_333))
    }

    /// Source ticking at a custom native cadence.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            epoch: Instant::now(),
            next_id: 0,
            active: HashMap::new(),
        }
    }
}

impl Default for ThreadFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ThreadFrameSource {
    fn request(&mut self, mut tick: TickFn) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;

        let running = Arc::new(AtomicBool::new(true));
        self.active.insert(handle, running.clone());

        let interval = self.interval;
        let epoch = self.epoch;
        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                thread::sleep(interval);
                if running.load(Ordering::SeqCst) {
                    tick(epoch.elapsed().as_secs_f64() * 1000.0);
                }
            }
        });

        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        if let Some(running) = self.active.remove(&handle) {
            running.store(false, Ordering::SeqCst);
            // The thread exits on its next flag check; no join, cancel
            // must not block the caller.
        }
    }
}

impl Drop for ThreadFrameSource {
    fn drop(&mut self) {
        for running in self.active.values() {
            running.store(false, Ordering::SeqCst);
        }
    }
}

// =============================================================================
// ManualFrameSource
// =============================================================================

/// Host-driven frame source.
///
/// `fire` runs every registered callback synchronously on the calling
/// thread with the timestamp the host supplies. Clones share the same
/// registry, so a host (or test) keeps one clone and hands another to the
/// engine.
#[derive(Clone, Default)]
pub struct ManualFrameSource {
    inner: Arc<Mutex<ManualInner>>,
}

#[derive(Default)]
struct ManualInner {
    next_id: u64,
    callbacks: HashMap<TickHandle, TickFn>,
    /// Handles cancelled while a `fire` had their callbacks checked out.
    cancelled: HashSet<TickHandle>,
}

impl ManualFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one tick with `now_ms` to every active callback.
    pub fn fire(&self, now_ms: f64) {
        // Callbacks are taken out while firing so a callback that calls
        // back into this source (e.g. teardown from inside a tick) does
        // not deadlock on the registry lock.
        let mut callbacks = {
            let mut inner = self.inner.lock().unwrap();
            std::mem::take(&mut inner.callbacks)
        };
        for tick in callbacks.values_mut() {
            tick(now_ms);
        }
        let mut inner = self.inner.lock().unwrap();
        for (handle, tick) in callbacks {
            // A callback cancelled mid-fire stays removed
            if inner.cancelled.contains(&handle) {
                continue;
            }
            inner.callbacks.entry(handle).or_insert(tick);
        }
        inner.cancelled.clear();
    }

    /// Number of active registrations.
    pub fn active(&self) -> usize {
        self.inner.lock().unwrap().callbacks.len()
    }
}

impl FrameSource for ManualFrameSource {
    fn request(&mut self, tick: TickFn) -> TickHandle {
        let mut inner = self.inner.lock().unwrap();
        let handle = TickHandle(inner.next_id);
        inner.next_id += 1;
        inner.callbacks.insert(handle, tick);
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        let mut inner = self.inner.lock().unwrap();
        inner.callbacks.remove(&handle);
        inner.cancelled.insert(handle);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_manual_source_fires_registered_callback() {
        let mut source = ManualFrameSource::new();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();

        let handle = source.request(Box::new(move |now| {
            assert_eq!(now, 16.0);
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(source.active(), 1);

        source.fire(16.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        source.cancel(handle);
        assert_eq!(source.active(), 0);
        source.fire(32.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_manual_source_cancel_during_fire_sticks() {
        let mut source = ManualFrameSource::new();
        let mut inside = source.clone();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();

        let slot: Arc<Mutex<Option<TickHandle>>> = Arc::new(Mutex::new(None));
        let slot_inside = slot.clone();
        let handle = source.request(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            let handle = slot_inside.lock().unwrap().unwrap();
            inside.cancel(handle);
        }));
        *slot.lock().unwrap() = Some(handle);

        source.fire(16.0);
        source.fire(32.0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(source.active(), 0);
    }

    #[test]
    fn test_thread_source_delivers_and_cancels() {
        let mut source = ThreadFrameSource::with_interval(Duration::from_millis(1));
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();

        let handle = source.request(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        thread::sleep(Duration::from_millis(50));
        source.cancel(handle);
        let at_cancel = count.load(Ordering::SeqCst);
        assert!(at_cancel > 0);

        // One in-flight tick may land around the cancel; after a settle
        // window the count must stop moving.
        thread::sleep(Duration::from_millis(20));
        let settled = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn test_thread_source_timestamps_increase() {
        let mut source = ThreadFrameSource::with_interval(Duration::from_millis(1));
        let stamps: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = stamps.clone();

        let handle = source.request(Box::new(move |now| {
            sink.lock().unwrap().push(now);
        }));
        thread::sleep(Duration::from_millis(30));
        source.cancel(handle);

        let stamps = stamps.lock().unwrap();
        assert!(stamps.len() >= 2);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }
}
