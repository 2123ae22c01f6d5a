//! Grid state - the flat opacity buffer and its geometry.
//!
//! The grid is a column-major `Vec<f32>` of per-cell opacities. Geometry
//! is derived from the logical container size and the configured cell
//! size and gap; the buffer is reallocated and re-randomized only when
//! the derived shape or the opacity ceiling actually changes, so resize
//! events that do not move a cell boundary are free.

use log::debug;
use rand::Rng;

use crate::config::FlickerConfig;

/// Fraction of the buffer sampled by each accepted update pass.
pub const UPDATE_FRACTION: f64 = 0.1;

// =============================================================================
// GridState
// =============================================================================

/// Opacity buffer plus derived geometry for one engine instance.
///
/// Index `i` maps to `(col = i / rows, row = i % rows)`.
#[derive(Debug)]
pub struct GridState {
    buffer: Vec<f32>,
    cols: usize,
    rows: usize,
    density: f32,
    last_max_opacity: f32,
}

impl GridState {
    /// Create an empty grid with the given backing-pixel density.
    pub fn new(density: f32) -> Self {
        Self {
            buffer: Vec::new(),
            cols: 0,
            rows: 0,
            density,
            last_max_opacity: f32::NAN,
        }
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Backing-pixel scale factor.
    pub fn density(&self) -> f32 {
        self.density
    }

    /// The raw opacity buffer, column-major.
    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    /// Opacity of the cell at `(col, row)`.
    pub fn opacity(&self, col: usize, row: usize) -> f32 {
        self.buffer[col * self.rows + row]
    }

    /// Whether the grid currently has any cells.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Recompute `cols`/`rows` from the logical container size.
    ///
    /// `cols = ceil(width / (cell_size + gap))`, likewise for rows. A
    /// non-positive dimension or cell step yields an empty grid.
    ///
    /// The buffer is reallocated and refilled with independent
    /// `uniform(0, max_opacity)` samples iff the shape or `max_opacity`
    /// changed since the last call; otherwise existing values survive.
    /// Returns whether a reallocation happened.
    pub fn recompute_geometry(&mut self, width: f32, height: f32, config: &FlickerConfig) -> bool {
        let step = config.cell_size + config.gap;
        let (cols, rows) = if step > 0.0 && width > 0.0 && height > 0.0 {
            (
                (width / step).ceil() as usize,
                (height / step).ceil() as usize,
            )
        } else {
            (0, 0)
        };

        let shape_changed = (cols, rows) != (self.cols, self.rows);
        let ceiling_changed = self.last_max_opacity != config.max_opacity;
        self.cols = cols;
        self.rows = rows;
        if !shape_changed && !ceiling_changed {
            return false;
        }

        debug!(
            "grid reallocated: {cols}x{rows} cells, max opacity {}",
            config.max_opacity
        );
        self.last_max_opacity = config.max_opacity;
        let mut rng = rand::thread_rng();
        self.buffer.clear();
        self.buffer
            .resize_with(cols * rows, || rng.gen_range(0.0..=config.max_opacity));
        true
    }

    /// One stochastic update pass.
    ///
    /// Samples `max(1, floor(len * 0.1))` uniformly random indices; each
    /// re-randomizes with probability `flicker_chance * delta_ms / 1000`
    /// and is then clamped to `max_opacity` unconditionally. Indices not
    /// sampled this pass are left untouched, including their clamp (only
    /// actively-sampled cells decay toward a lowered ceiling).
    pub fn update_pass(
        &mut self,
        delta_ms: f64,
        config: &FlickerConfig,
        rng: &mut impl Rng,
    ) {
        if self.buffer.is_empty() {
            return;
        }
        let samples = ((self.buffer.len() as f64 * UPDATE_FRACTION) as usize).max(1);
        let flicker_probability = config.flicker_chance as f64 * (delta_ms / 1000.0);
        for _ in 0..samples {
            let index = rng.gen_range(0..self.buffer.len());
            if rng.gen_range(0.0..1.0) < flicker_probability {
                self.buffer[index] = rng.gen_range(0.0..=config.max_opacity);
            }
            if self.buffer[index] > config.max_opacity {
                self.buffer[index] = config.max_opacity;
            }
        }
    }
}

#[cfg(test)]
impl GridState {
    /// Test hook: overwrite one buffer value directly.
    pub(crate) fn set_raw(&mut self, index: usize, value: f32) {
        self.buffer[index] = value;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cell_size: f32, gap: f32, max_opacity: f32) -> FlickerConfig {
        FlickerConfig {
            cell_size,
            gap,
            max_opacity,
            ..Default::default()
        }
    }

    #[test]
    fn test_geometry_formula() {
        let mut grid = GridState::new(1.0);
        grid.recompute_geometry(100.0, 100.0, &config(4.0, 6.0, 0.3));
        assert_eq!(grid.cols(), 10);
        assert_eq!(grid.rows(), 10);
        assert_eq!(grid.buffer().len(), 100);
    }

    #[test]
    fn test_geometry_rounds_up() {
        let mut grid = GridState::new(1.0);
        grid.recompute_geometry(101.0, 99.0, &config(4.0, 6.0, 0.3));
        assert_eq!(grid.cols(), 11);
        assert_eq!(grid.rows(), 10);
        assert_eq!(grid.buffer().len(), 110);
    }

    #[test]
    fn test_zero_area_yields_empty_grid() {
        let mut grid = GridState::new(1.0);
        grid.recompute_geometry(0.0, 100.0, &config(4.0, 6.0, 0.3));
        assert_eq!(grid.cols(), 0);
        assert!(grid.is_empty());

        // A zero cell step is equally degenerate
        grid.recompute_geometry(100.0, 100.0, &config(0.0, 0.0, 0.3));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_initial_fill_within_bounds() {
        let mut grid = GridState::new(1.0);
        grid.recompute_geometry(200.0, 200.0, &config(4.0, 6.0, 0.3));
        assert!(grid.buffer().iter().all(|&v| (0.0..=0.3).contains(&v)));
    }

    #[test]
    fn test_recompute_idempotent_on_unchanged_geometry() {
        let mut grid = GridState::new(1.0);
        let cfg = config(4.0, 6.0, 0.3);
        assert!(grid.recompute_geometry(100.0, 100.0, &cfg));

        grid.buffer[42] = 0.123;
        assert!(!grid.recompute_geometry(100.0, 100.0, &cfg));
        assert_eq!(grid.buffer[42], 0.123);

        // A size change that lands on the same cell counts is also a no-op
        assert!(!grid.recompute_geometry(99.0, 98.0, &cfg));
        assert_eq!(grid.buffer[42], 0.123);
    }

    #[test]
    fn test_max_opacity_change_forces_reinit() {
        let mut grid = GridState::new(1.0);
        grid.recompute_geometry(100.0, 100.0, &config(4.0, 6.0, 0.9));
        grid.buffer.fill(0.9);

        assert!(grid.recompute_geometry(100.0, 100.0, &config(4.0, 6.0, 0.2)));
        assert_eq!(grid.buffer().len(), 100);
        assert!(grid.buffer().iter().all(|&v| (0.0..=0.2).contains(&v)));
    }

    #[test]
    fn test_resize_reinitializes_in_range() {
        let mut grid = GridState::new(1.0);
        let cfg = config(4.0, 6.0, 0.3);
        grid.recompute_geometry(100.0, 100.0, &cfg);

        grid.recompute_geometry(50.0, 50.0, &cfg);
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.rows(), 5);
        assert_eq!(grid.buffer().len(), 25);
        assert!(grid.buffer().iter().all(|&v| (0.0..=0.3).contains(&v)));
    }

    #[test]
    fn test_update_pass_keeps_bounds() {
        let mut grid = GridState::new(1.0);
        // A huge flicker chance makes every sampled index re-randomize
        let cfg = config(4.0, 6.0, 0.3);
        let hot = FlickerConfig {
            flicker_chance: 1000.0,
            ..cfg.clone()
        };
        grid.recompute_geometry(100.0, 100.0, &cfg);

        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            grid.update_pass(33.0, &hot, &mut rng);
        }
        assert!(grid.buffer().iter().all(|&v| (0.0..=0.3).contains(&v)));
    }

    #[test]
    fn test_update_pass_clamps_sampled_index() {
        let mut grid = GridState::new(1.0);
        // Single-cell grid: the one sample per pass must hit index 0
        grid.recompute_geometry(1.0, 1.0, &config(1.0, 0.0, 0.9));
        grid.buffer[0] = 0.9;

        let lowered = config(1.0, 0.0, 0.5);
        let calm = FlickerConfig {
            flicker_chance: 0.0,
            ..lowered
        };
        grid.update_pass(33.0, &calm, &mut rand::thread_rng());
        assert_eq!(grid.buffer[0], 0.5);
    }

    #[test]
    fn test_update_pass_on_empty_grid_is_noop() {
        let mut grid = GridState::new(1.0);
        grid.update_pass(33.0, &config(4.0, 6.0, 0.3), &mut rand::thread_rng());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_column_major_indexing() {
        let mut grid = GridState::new(1.0);
        grid.recompute_geometry(30.0, 20.0, &config(4.0, 6.0, 0.3));
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.rows(), 2);

        grid.buffer[1 * 2 + 1] = 0.25;
        assert_eq!(grid.opacity(1, 1), 0.25);
    }
}
