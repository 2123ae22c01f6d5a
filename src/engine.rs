//! Engine facade - wires grid, scheduler, visibility and surface together.
//!
//! A [`FlickerGrid`] owns one drawable surface for its whole lifetime and
//! exposes the inbound signal interface the host drives: container
//! resizes, viewport intersection, host backgrounding, teardown. Dropping
//! the handle tears down, so a pending tick can never outlive the
//! instance it would write into.
//!
//! # Example
//!
//! ```ignore
//! use flicker_grid::{FlickerConfig, FlickerGrid, ThreadFrameSource, TerminalSurface};
//!
//! let surface = TerminalSurface::new(10.0);
//! let config = FlickerConfig { start_immediately: true, ..Default::default() };
//! let mut grid = FlickerGrid::attach(surface, Box::new(ThreadFrameSource::new()), config);
//! grid.on_container_resize(800.0, 600.0);
//! // ... host event loop ...
//! grid.teardown();
//! ```

use std::sync::{Arc, Mutex};

use log::debug;

use crate::color::{resolve_or_fallback, RgbaPrefix};
use crate::config::FlickerConfig;
use crate::grid::GridState;
use crate::render::render_pass;
use crate::scheduler::{FrameScheduler, FrameSource, TickGate};
use crate::surface::Surface;
use crate::visibility::{Gate, VisibilityController};

// =============================================================================
// EngineCore
// =============================================================================

/// Everything a tick touches, behind one lock.
///
/// Ticks arrive on the frame-source thread; resize and visibility signals
/// arrive on the host thread. The lock makes each complete atomically
/// with respect to the next tick, which is the only synchronization the
/// engine needs.
struct EngineCore<S: Surface> {
    grid: GridState,
    config: FlickerConfig,
    color: RgbaPrefix,
    gate: TickGate,
    surface: S,
    backing: (u32, u32),
    released: bool,
}

impl<S: Surface> EngineCore<S> {
    fn tick(&mut self, now_ms: f64) {
        if self.released {
            return;
        }
        let Some(accepted) = self.gate.accept(now_ms) else {
            return;
        };
        let mut rng = rand::thread_rng();
        self.grid.update_pass(accepted.delta_ms, &self.config, &mut rng);
        if accepted.render {
            render_pass(&mut self.surface, &self.grid, &self.config, &self.color);
        }
    }

    fn handle_resize(&mut self, width: f32, height: f32) {
        let (width, height) = self.config.fixed_size.unwrap_or((width, height));
        self.grid.recompute_geometry(width, height, &self.config);

        let density = self.config.density;
        let backing = (
            (width.max(0.0) * density).round() as u32,
            (height.max(0.0) * density).round() as u32,
        );
        // Backing reallocation discards surface contents; skip when the
        // pixel size is unchanged.
        if backing != self.backing {
            self.backing = backing;
            self.surface.resize(backing.0, backing.1);
        }
    }

    fn clear_surface(&mut self) {
        self.surface.clear();
        self.surface.present();
    }
}

// =============================================================================
// FlickerGrid
// =============================================================================

/// One flicker-grid instance: configuration, state, and lifecycle.
pub struct FlickerGrid<S: Surface + 'static> {
    core: Arc<Mutex<EngineCore<S>>>,
    scheduler: FrameScheduler,
    visibility: VisibilityController,
}

impl<S: Surface + 'static> FlickerGrid<S> {
    /// Attach the engine to a surface and frame source.
    ///
    /// Resolves the configured color once (falling back to opaque black),
    /// normalizes the config, and - when `start_immediately` is set -
    /// enters Running without waiting for a visibility signal. The grid
    /// stays empty until the first [`Self::on_container_resize`] unless
    /// `fixed_size` is configured.
    pub fn attach(surface: S, source: Box<dyn FrameSource>, config: FlickerConfig) -> Self {
        let config = config.normalized();
        let color = resolve_or_fallback(&config.color);
        debug!(
            "attaching flicker grid: cell {}px gap {}px, color prefix {}",
            config.cell_size,
            config.gap,
            color.as_prefix()
        );

        let mut core = EngineCore {
            grid: GridState::new(config.density),
            config,
            color,
            gate: TickGate::new(),
            surface,
            backing: (0, 0),
            released: false,
        };
        if core.config.fixed_size.is_some() {
            core.handle_resize(0.0, 0.0);
        }

        let (visibility, gate) = VisibilityController::attach(core.config.start_immediately);
        let mut engine = Self {
            core: Arc::new(Mutex::new(core)),
            scheduler: FrameScheduler::new(source),
            visibility,
        };
        if let Some(gate) = gate {
            engine.apply(gate);
        }
        engine
    }

    /// The host container changed logical size.
    ///
    /// Applied atomically between ticks; ignored after teardown. A
    /// configured `fixed_size` overrides the reported dimensions.
    pub fn on_container_resize(&mut self, width: f32, height: f32) {
        if self.visibility.is_released() {
            return;
        }
        self.lock_core().handle_resize(width, height);
    }

    /// The surface entered or left the viewport.
    pub fn on_visibility_change(&mut self, intersecting: bool) {
        if let Some(gate) = self.visibility.on_intersection(intersecting) {
            self.apply(gate);
        }
    }

    /// The host process was backgrounded or foregrounded.
    pub fn on_host_backgrounded(&mut self, hidden: bool) {
        if let Some(gate) = self.visibility.on_host_backgrounded(hidden) {
            self.apply(gate);
        }
    }

    /// Release the scheduler registration and observation. Idempotent;
    /// every later signal is a no-op and no tick body runs afterwards.
    pub fn teardown(&mut self) {
        if let Some(gate) = self.visibility.detach() {
            debug!("flicker grid torn down");
            self.apply(gate);
        }
    }

    /// Whether the frame scheduler is currently Running.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Current `(cols, rows)` geometry.
    pub fn dimensions(&self) -> (usize, usize) {
        let core = self.lock_core();
        (core.grid.cols(), core.grid.rows())
    }

    /// Number of accepted ticks so far.
    pub fn frames(&self) -> u64 {
        self.lock_core().gate.frames()
    }

    /// Inspect the grid state under the engine lock.
    pub fn with_grid<R>(&self, f: impl FnOnce(&GridState) -> R) -> R {
        f(&self.lock_core().grid)
    }

    /// Access the surface adapter under the engine lock.
    pub fn with_surface<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock_core().surface)
    }

    fn apply(&mut self, gate: Gate) {
        match gate {
            Gate::Start => {
                let core = Arc::clone(&self.core);
                self.scheduler.start(Box::new(move |now_ms| {
                    let mut core = core.lock().unwrap_or_else(|e| e.into_inner());
                    core.tick(now_ms);
                }));
            }
            Gate::Suspend => self.scheduler.stop(),
            Gate::ClearSurface => self.lock_core().clear_surface(),
            Gate::Release => {
                self.scheduler.stop();
                self.lock_core().released = true;
            }
        }
    }

    fn lock_core(&self) -> std::sync::MutexGuard<'_, EngineCore<S>> {
        // A poisoned lock means a tick panicked; the engine still degrades
        // to draw-nothing rather than propagating the panic to the host.
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: Surface + 'static> Drop for FlickerGrid<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

// =============================================================================
// Tests
// =============================================================================
