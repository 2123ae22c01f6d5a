//! Flickering grid in the terminal.
//!
//! Run with `cargo run --example terminal_grid`. Resize the terminal to
//! watch the grid reflow; press `q` or Ctrl+C to quit.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyModifiers},
    execute, terminal,
};

use flicker_grid::{FlickerConfig, FlickerGrid, TerminalSurface, ThreadFrameSource};

/// Pixels per terminal cell; matches cell_size + gap below so every grid
/// square maps onto exactly one terminal cell.
const PX_PER_CELL: f32 = 10.0;

fn main() -> io::Result<()> {
    env_logger::init();

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
    stdout.flush()?;

    let result = run();

    execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn run() -> io::Result<()> {
    let config = FlickerConfig {
        color: "#38bdf8".to_string(),
        max_opacity: 0.6,
        flicker_chance: 0.6,
        start_immediately: true,
        ..Default::default()
    };

    let mut grid = FlickerGrid::attach(
        TerminalSurface::new(PX_PER_CELL),
        Box::new(ThreadFrameSource::new()),
        config,
    );

    let (cols, rows) = terminal::size()?;
    grid.on_container_resize(cols as f32 * PX_PER_CELL, rows as f32 * PX_PER_CELL);

    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) => {
                let ctrl_c = key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL);
                if key.code == KeyCode::Char('q') || key.code == KeyCode::Esc || ctrl_c {
                    break;
                }
            }
            Event::Resize(cols, rows) => {
                grid.on_container_resize(cols as f32 * PX_PER_CELL, rows as f32 * PX_PER_CELL);
            }
            Event::FocusLost => grid.on_host_backgrounded(true),
            Event::FocusGained => grid.on_host_backgrounded(false),
            _ => {}
        }
    }

    grid.teardown();
    Ok(())
}
