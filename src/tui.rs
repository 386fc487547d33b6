use crate::error::{AppError, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::ops::{Deref, DerefMut};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Owns the terminal while the panel is on screen. Restores it on drop, so
/// an early `?` return from the main loop leaves a usable shell behind.
pub struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    /// Enables raw mode, enters the alternate screen and installs a panic
    /// hook that restores the terminal before the panic message prints.
    pub fn init() -> Result<Self> {
        enable_raw_mode().map_err(AppError::Io)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(AppError::Io)?;

        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = restore();
            previous(info);
        }));

        let terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(AppError::Io)?;
        Ok(Self { terminal })
    }
}

impl Deref for TerminalGuard {
    type Target = Tui;

    fn deref(&self) -> &Tui {
        &self.terminal
    }
}

impl DerefMut for TerminalGuard {
    fn deref_mut(&mut self) -> &mut Tui {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore();
        let _ = self.terminal.show_cursor();
    }
}

fn restore() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)
}
