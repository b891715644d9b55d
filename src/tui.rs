use std::io::{Stdout, stdout};

use anyhow::{Context, Result};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Enter raw mode on the alternate screen.
pub fn init() -> Result<Tui> {
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout(), EnterAlternateScreen).context("failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout())).context("failed to create terminal")
}

/// Leave the alternate screen and restore cooked mode.
pub fn restore() -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(stdout(), LeaveAlternateScreen).context("failed to leave alternate screen")?;
    Ok(())
}
