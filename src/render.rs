//! Render pass - paints the opacity buffer onto the surface.
//!
//! The pass clears the backing store, then walks the grid and paints only
//! cells whose opacity clears a small visibility threshold. Cells below it
//! are indistinguishable from transparent, so skipping them eliminates the
//! bulk of the draw calls on a mostly-dark grid.

use crate::color::RgbaPrefix;
use crate::config::FlickerConfig;
use crate::grid::GridState;
use crate::surface::Surface;

/// Cells at or below this opacity are not painted.
pub const MIN_VISIBLE_OPACITY: f32 = 0.01;

/// Paint the current buffer onto `surface`.
///
/// Coordinates are physical pixels: cell `(col, row)` lands at
/// `(col * (cell_size + gap) * density, row * (cell_size + gap) * density)`
/// with edge `cell_size * density`. Ends with one `present` call. An empty
/// grid still clears and presents, which is what makes a zero-area
/// container render as nothing rather than as stale pixels.
pub fn render_pass<S: Surface + ?Sized>(
    surface: &mut S,
    grid: &GridState,
    config: &FlickerConfig,
    color: &RgbaPrefix,
) {
    surface.clear();

    let density = grid.density();
    let step = (config.cell_size + config.gap) * density;
    let edge = config.cell_size * density;

    for col in 0..grid.cols() {
        for row in 0..grid.rows() {
            let opacity = grid.opacity(col, row);
            if opacity > MIN_VISIBLE_OPACITY {
                surface.fill_rect(
                    col as f32 * step,
                    row as f32 * step,
                    edge,
                    edge,
                    &color.fill(opacity),
                );
            }
        }
    }

    surface.present();
}

// =============================================================================
// Tests
// =============================================================================
