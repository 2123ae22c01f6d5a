//! Terminal surface adapter.
//!
//! Maps the engine's pixel-space draw calls onto terminal cells through
//! crossterm. One terminal cell covers `px_per_cell` physical pixels on
//! each axis, so sizing it to the configured `cell_size + gap` renders
//! one grid square per terminal cell.
//!
//! Output is diffed against the previously presented frame and flushed in
//! a single batch per `present`, so a mostly-static grid costs almost no
//! terminal I/O. Draw errors are logged and swallowed; a broken terminal
//! degrades the effect to nothing, it never reaches the engine.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use log::warn;

use super::Surface;

const BLOCK: char = '█';

/// Crossterm-backed [`Surface`] painting into the current terminal.
pub struct TerminalSurface {
    px_per_cell: f32,
    cols: u16,
    rows: u16,
    cells: Vec<Option<(u8, u8, u8)>>,
    prev: Option<Vec<Option<(u8, u8, u8)>>>,
    out: io::Stdout,
}

impl TerminalSurface {
    /// Create an adapter where one terminal cell spans `px_per_cell`
    /// pixels per axis. Non-positive values fall back to one pixel per
    /// cell.
    pub fn new(px_per_cell: f32) -> Self {
        Self {
            px_per_cell: if px_per_cell > 0.0 { px_per_cell } else { 1.0 },
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            prev: None,
            out: io::stdout(),
        }
    }

    /// Terminal-cell dimensions of the current backing store.
    pub fn cell_dimensions(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn set_cell(&mut self, col: u16, row: u16, color: (u8, u8, u8)) {
        if col >= self.cols || row >= self.rows {
            return;
        }
        let index = row as usize * self.cols as usize + col as usize;
        self.cells[index] = Some(color);
    }

    fn flush_frame(&mut self) -> io::Result<()> {
        // An empty or size-mismatched previous frame forces a full redraw
        let prev = self
            .prev
            .take()
            .filter(|p| p.len() == self.cells.len())
            .unwrap_or_default();

        for row in 0..self.rows {
            for col in 0..self.cols {
                let index = row as usize * self.cols as usize + col as usize;
                if prev.get(index) == Some(&self.cells[index]) {
                    continue;
                }
                queue!(self.out, MoveTo(col, row))?;
                match self.cells[index] {
                    Some((r, g, b)) => {
                        queue!(
                            self.out,
                            SetForegroundColor(Color::Rgb { r, g, b }),
                            Print(BLOCK)
                        )?;
                    }
                    None => {
                        queue!(self.out, ResetColor, Print(' '))?;
                    }
                }
            }
        }
        self.out.flush()?;
        self.prev = Some(self.cells.clone());
        Ok(())
    }
}

impl Surface for TerminalSurface {
    fn resize(&mut self, width_px: u32, height_px: u32) {
        self.cols = (width_px as f32 / self.px_per_cell).ceil() as u16;
        self.rows = (height_px as f32 / self.px_per_cell).ceil() as u16;
        self.cells = vec![None; self.cols as usize * self.rows as usize];
        self.prev = None;

        let mut wipe = || -> io::Result<()> {
            queue!(self.out, Clear(ClearType::All))?;
            self.out.flush()
        };
        if let Err(e) = wipe() {
            warn!("terminal clear failed: {e}");
        }
    }

    fn clear(&mut self) {
        self.cells.fill(None);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: &str) {
        let Some((r, g, b, alpha)) = parse_rgba(fill) else {
            return;
        };
        // Composite onto the terminal's black background
        let color = (
            (r as f32 * alpha) as u8,
            (g as f32 * alpha) as u8,
            (b as f32 * alpha) as u8,
        );

        // Cover [x, x+w) exclusive of the far edge, so rects ending on a
        // cell boundary do not bleed into the next cell
        let first_col = (x / self.px_per_cell).floor() as i64;
        let last_col = ((x + width) / self.px_per_cell).ceil() as i64 - 1;
        let first_row = (y / self.px_per_cell).floor() as i64;
        let last_row = ((y + height) / self.px_per_cell).ceil() as i64 - 1;
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                if row >= 0 && col >= 0 {
                    self.set_cell(col as u16, row as u16, color);
                }
            }
        }
    }

    fn present(&mut self) {
        if let Err(e) = self.flush_frame() {
            warn!("terminal present failed: {e}");
        }
    }
}

/// Parse a `rgba(r,g,b,a)` fill style built by the engine.
fn parse_rgba(fill: &str) -> Option<(u8, u8, u8, f32)> {
    let content = fill.strip_prefix("rgba(")?.strip_suffix(')')?;
    let mut parts = content.split(',').map(str::trim);
    let r = parts.next()?.parse::<u8>().ok()?;
    let g = parts.next()?.parse::<u8>().ok()?;
    let b = parts.next()?.parse::<u8>().ok()?;
    let alpha = parts.next()?.parse::<f32>().ok()?;
    if parts.next().is_some() || !(0.0..=1.0).contains(&alpha) {
        return None;
    }
    Some((r, g, b, alpha))
}

// =============================================================================
// Tests
// =============================================================================
