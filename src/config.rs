//! Engine configuration.
//!
//! A [`FlickerConfig`] is immutable for the lifetime of an engine instance;
//! changing parameters means detaching and attaching a fresh instance,
//! which re-resolves the color and reinitializes the grid.

/// Configuration for one flicker-grid instance.
///
/// Defaults match the upstream ambient-background effect: 4px cells with a
/// 6px gap, peak opacity 0.3, and a 0.3/s flicker probability density.
#[derive(Debug, Clone, PartialEq)]
pub struct FlickerConfig {
    /// Edge length of one grid cell, in logical pixels.
    pub cell_size: f32,
    /// Spacing between adjacent cells, in logical pixels.
    pub gap: f32,
    /// Upper bound for every cell opacity, in `[0, 1]`.
    pub max_opacity: f32,
    /// Probability density per second that a sampled cell re-randomizes.
    pub flicker_chance: f32,
    /// Color specification (hex, `rgb(...)`/`rgba(...)`, or a named color).
    pub color: String,
    /// Backing-pixel scale factor (the host's pixel-ratio analog).
    pub density: f32,
    /// Start the scheduler without waiting for a visibility signal.
    pub start_immediately: bool,
    /// Fixed logical size overriding container-reported dimensions.
    pub fixed_size: Option<(f32, f32)>,
}

impl Default for FlickerConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            gap: 6.0,
            max_opacity: 0.3,
            flicker_chance: 0.3,
            color: "rgb(0, 0, 0)".to_string(),
            density: 1.0,
            start_immediately: false,
            fixed_size: None,
        }
    }
}

impl FlickerConfig {
    /// Coerce out-of-range numeric parameters to safe values.
    ///
    /// Applied once at attach time. NaN and negative inputs collapse to
    /// zero (or 1.0 for density), `max_opacity` is capped at 1.0; none of
    /// these are errors, the engine degrades to a dimmer or static grid.
    pub fn normalized(mut self) -> Self {
        self.cell_size = sanitize(self.cell_size);
        self.gap = sanitize(self.gap);
        self.max_opacity = sanitize(self.max_opacity).min(1.0);
        self.flicker_chance = sanitize(self.flicker_chance);
        self.density = if self.density.is_finite() && self.density > 0.0 {
            self.density
        } else {
            1.0
        };
        if let Some((w, h)) = self.fixed_size {
            self.fixed_size = Some((sanitize(w), sanitize(h)));
        }
        self
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

// =============================================================================
// Tests
// =============================================================================
