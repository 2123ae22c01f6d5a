//! # flicker-grid
//!
//! Procedural grid-flicker animation engine: the ambient background
//! effect of stochastically flickering squares, packaged as a
//! self-contained real-time simulation with its own scheduling and
//! resource management.
//!
//! ## Architecture
//!
//! The engine is a single-writer cooperative loop over a flat opacity
//! buffer:
//!
//! ```text
//! FrameSource ticks → TickGate (30 fps throttle) → update pass
//!                                                → render pass (every
//!                                                  other accepted tick)
//! ```
//!
//! A [`VisibilityController`] gates the scheduler so off-screen instances
//! cost nothing, and every host dependency is an injected capability: the
//! drawable [`Surface`], the [`FrameSource`] callback primitive, and the
//! inbound resize/visibility/backgrounding signals on [`FlickerGrid`].
//!
//! ## Modules
//!
//! - [`color`] - color-spec resolution into a reusable fill prefix
//! - [`config`] - per-instance configuration
//! - [`grid`] - opacity buffer, geometry, stochastic update pass
//! - [`render`] - threshold-gated surface painting
//! - [`scheduler`] - frame sources, throttle, Idle/Running machine
//! - [`visibility`] - viewport/backgrounding state machine
//! - [`surface`] - drawable-surface trait and bundled adapters
//! - [`engine`] - the [`FlickerGrid`] facade hosts drive

pub mod color;
pub mod config;
pub mod engine;
pub mod grid;
pub mod render;
pub mod scheduler;
pub mod surface;
pub mod visibility;

// Re-export the host-facing surface area
pub use color::{resolve, resolve_or_fallback, RgbaPrefix};
pub use config::FlickerConfig;
pub use engine::FlickerGrid;
pub use grid::GridState;
pub use render::{render_pass, MIN_VISIBLE_OPACITY};
pub use scheduler::{
    AcceptedTick, FrameScheduler, FrameSource, ManualFrameSource, ThreadFrameSource, TickFn,
    TickGate, TickHandle, FRAME_INTERVAL_MS, TARGET_FPS,
};
pub use surface::{RecordingSurface, Surface, SurfaceOp, TerminalSurface};
pub use visibility::{Gate, VisibilityController, VisibilityState, INTERSECTION_THRESHOLD};
